//! Product management route handlers (level 2).

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use chrono::Utc;
use tower_sessions::Session;
use tracing::instrument;

use storeroom_core::{CategoryId, Level, MediaId, Price, ProductId};

use crate::db::{
    CategoryRepository, Collection, MediaRepository, ProductRepository, RecordStore,
};
use crate::filters;
use crate::flow::{FormData, PageFlow, field};
use crate::middleware::require_level;
use crate::models::{Category, Flash, Media, Product, ProductDetail, Severity, flash, take_flash};
use crate::state::AppState;

const PRODUCT_FLOW: PageFlow = PageFlow {
    collection: Collection::Products,
    entity: "Product",
    required: &[
        "product-title",
        "product-categorie",
        "product-quantity",
        "buying-price",
        "saleing-price",
    ],
    list_path: "/products",
};

/// Product listing template.
#[derive(Template)]
#[template(path = "products/index.html")]
struct ProductsIndexTemplate {
    title: &'static str,
    flash: Option<Flash>,
    products: Vec<ProductDetail>,
}

/// Add product form template.
#[derive(Template)]
#[template(path = "products/add.html")]
struct ProductsAddTemplate {
    title: &'static str,
    flash: Option<Flash>,
    categories: Vec<Category>,
    photos: Vec<Media>,
}

/// Edit product form template.
#[derive(Template)]
#[template(path = "products/edit.html")]
struct ProductsEditTemplate {
    title: &'static str,
    flash: Option<Flash>,
    product: Product,
    categories: Vec<Category>,
    photos: Vec<Media>,
}

/// The numeric pieces of a product submission.
struct ProductFields {
    quantity: i64,
    buy_price: Price,
    sale_price: Price,
    categorie_id: CategoryId,
    media_id: Option<MediaId>,
}

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index))
        .route("/products/add", get(add_page).post(add))
        .route("/products/{id}/edit", get(edit_page).post(edit))
        .route("/products/{id}/delete", get(delete))
}

async fn load_selects(state: &AppState) -> (Vec<Category>, Vec<Media>) {
    let categories = CategoryRepository::new(state.pool())
        .list_all()
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to list categories");
            vec![]
        });
    let photos = MediaRepository::new(state.pool())
        .list_all()
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to list media");
            vec![]
        });
    (categories, photos)
}

fn parse_product_fields(form: &FormData) -> Result<ProductFields, &'static str> {
    let quantity = field(form, "product-quantity")
        .and_then(|q| q.parse::<i64>().ok())
        .ok_or("Quantity must be a whole number.")?;
    let buy_price = field(form, "buying-price")
        .and_then(|p| Price::parse(p).ok())
        .ok_or("Buying price must be a number.")?;
    let sale_price = field(form, "saleing-price")
        .and_then(|p| Price::parse(p).ok())
        .ok_or("Selling price must be a number.")?;
    let categorie_id = field(form, "product-categorie")
        .and_then(|c| c.parse::<i64>().ok())
        .map(CategoryId::new)
        .ok_or("Choose a categorie.")?;
    // The photo select is optional; "0" means none.
    let media_id = field(form, "product-photo")
        .and_then(|m| m.parse::<i64>().ok())
        .filter(|m| *m != 0)
        .map(MediaId::new);

    Ok(ProductFields {
        quantity,
        buy_price,
        sale_price,
        categorie_id,
        media_id,
    })
}

/// Render the product listing.
///
/// GET /products
#[instrument(skip(state, session))]
async fn index(State(state): State<AppState>, session: Session) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::SPECIAL).await {
        return denied.into_response();
    }

    let products = ProductRepository::new(state.pool())
        .list_with_details()
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to list products");
            vec![]
        });

    let template = ProductsIndexTemplate {
        title: "Products",
        flash: take_flash(&session).await,
        products,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Render the add form.
///
/// GET /products/add
#[instrument(skip(state, session))]
async fn add_page(State(state): State<AppState>, session: Session) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::SPECIAL).await {
        return denied.into_response();
    }

    let (categories, photos) = load_selects(&state).await;
    let template = ProductsAddTemplate {
        title: "Add Product",
        flash: take_flash(&session).await,
        categories,
        photos,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Create a product.
///
/// POST /products/add
#[instrument(skip(state, session, form))]
async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<FormData>,
) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::SPECIAL).await {
        return denied.into_response();
    }

    if let Err(redirect) = PRODUCT_FLOW.validate(&session, &form, "/products/add").await {
        return redirect.into_response();
    }

    let fields = match parse_product_fields(&form) {
        Ok(fields) => fields,
        Err(reason) => {
            flash(&session, Severity::Danger, reason).await;
            return Redirect::to("/products/add").into_response();
        }
    };
    let name = field(&form, "product-title").unwrap_or_default();

    let outcome = ProductRepository::new(state.pool())
        .create(
            name,
            fields.quantity,
            fields.buy_price,
            fields.sale_price,
            Some(fields.categorie_id),
            fields.media_id,
            Utc::now().naive_utc(),
        )
        .await
        .map(|_| true);
    PRODUCT_FLOW
        .finish(
            &session,
            outcome,
            "Product added.",
            "/products",
            "Sorry, failed to add the product.",
            "/products/add",
        )
        .await
        .into_response()
}

/// Render the edit form.
///
/// GET /products/{id}/edit
#[instrument(skip(state, session))]
async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::SPECIAL).await {
        return denied.into_response();
    }

    let store = RecordStore::new(state.pool());
    if let Err(redirect) = PRODUCT_FLOW.resolve(&store, &session, id).await {
        return redirect.into_response();
    }
    let product = match ProductRepository::new(state.pool())
        .find_by_id(ProductId::new(id))
        .await
    {
        Ok(Some(product)) => product,
        _ => return Redirect::to("/products").into_response(),
    };

    let (categories, photos) = load_selects(&state).await;
    let template = ProductsEditTemplate {
        title: "Edit Product",
        flash: take_flash(&session).await,
        product,
        categories,
        photos,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Update a product.
///
/// POST /products/{id}/edit
#[instrument(skip(state, session, form))]
async fn edit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<FormData>,
) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::SPECIAL).await {
        return denied.into_response();
    }

    let store = RecordStore::new(state.pool());
    let record = match PRODUCT_FLOW.resolve(&store, &session, id).await {
        Ok(record) => record,
        Err(redirect) => return redirect.into_response(),
    };

    let back = format!("/products/{}/edit", record.id());
    if let Err(redirect) = PRODUCT_FLOW.validate(&session, &form, &back).await {
        return redirect.into_response();
    }

    let fields = match parse_product_fields(&form) {
        Ok(fields) => fields,
        Err(reason) => {
            flash(&session, Severity::Danger, reason).await;
            return Redirect::to(&back).into_response();
        }
    };
    let name = field(&form, "product-title").unwrap_or_default();

    let outcome = ProductRepository::new(state.pool())
        .update(
            ProductId::new(record.id()),
            name,
            fields.quantity,
            fields.buy_price,
            fields.sale_price,
            Some(fields.categorie_id),
            fields.media_id,
        )
        .await;
    let redirect = match outcome {
        Ok(true) => {
            flash(&session, Severity::Success, "Product updated.").await;
            Redirect::to(&back)
        }
        Ok(false) => {
            flash(&session, Severity::Danger, "Sorry, failed to update the product.").await;
            Redirect::to(&back)
        }
        Err(err) => {
            tracing::error!(error = %err, "product update failed");
            flash(&session, Severity::Danger, "Sorry, failed to update the product.").await;
            Redirect::to(&back)
        }
    };
    redirect.into_response()
}

/// Delete a product.
///
/// GET /products/{id}/delete
#[instrument(skip(state, session))]
async fn delete(State(state): State<AppState>, session: Session, Path(id): Path<i64>) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::SPECIAL).await {
        return denied.into_response();
    }

    let store = RecordStore::new(state.pool());
    PRODUCT_FLOW
        .delete(
            &store,
            &session,
            id,
            "Product deleted.",
            "Product deletion failed.",
        )
        .await
        .into_response()
}
