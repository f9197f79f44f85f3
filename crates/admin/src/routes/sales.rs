//! Sale entry route handlers (level 3).

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use chrono::NaiveDate;
use tower_sessions::Session;
use tracing::instrument;

use storeroom_core::{Level, Price, ProductId, SaleId};

use crate::db::{Collection, ProductRepository, RecordStore, SaleRepository};
use crate::filters;
use crate::flow::{FormData, PageFlow, field};
use crate::middleware::require_level;
use crate::models::{Flash, Product, Sale, SaleWithProduct, Severity, flash, take_flash};
use crate::state::AppState;

const SALE_FLOW: PageFlow = PageFlow {
    collection: Collection::Sales,
    entity: "Sale",
    required: &["product", "quantity", "price", "date"],
    list_path: "/sales",
};

/// Sale listing template.
#[derive(Template)]
#[template(path = "sales/index.html")]
struct SalesIndexTemplate {
    title: &'static str,
    flash: Option<Flash>,
    sales: Vec<SaleWithProduct>,
}

/// Add sale form template.
#[derive(Template)]
#[template(path = "sales/add.html")]
struct SalesAddTemplate {
    title: &'static str,
    flash: Option<Flash>,
    products: Vec<Product>,
}

/// Edit sale form template.
#[derive(Template)]
#[template(path = "sales/edit.html")]
struct SalesEditTemplate {
    title: &'static str,
    flash: Option<Flash>,
    sale: Sale,
    products: Vec<Product>,
}

/// The parsed pieces of a sale submission.
struct SaleFields {
    product_id: ProductId,
    qty: i64,
    price: Price,
    date: NaiveDate,
}

/// Build the sales router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sales", get(index))
        .route("/sales/add", get(add_page).post(add))
        .route("/sales/{id}/edit", get(edit_page).post(edit))
        .route("/sales/{id}/delete", get(delete))
}

async fn load_products(state: &AppState) -> Vec<Product> {
    ProductRepository::new(state.pool())
        .list_with_details()
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to list products");
            vec![]
        })
        .into_iter()
        .map(|detail| detail.product)
        .collect()
}

fn parse_sale_fields(form: &FormData) -> Result<SaleFields, &'static str> {
    let product_id = field(form, "product")
        .and_then(|p| p.parse::<i64>().ok())
        .map(ProductId::new)
        .ok_or("Choose a product.")?;
    let qty = field(form, "quantity")
        .and_then(|q| q.parse::<i64>().ok())
        .filter(|q| *q > 0)
        .ok_or("Quantity must be a positive whole number.")?;
    let price = field(form, "price")
        .and_then(|p| Price::parse(p).ok())
        .ok_or("Price must be a number.")?;
    let date = field(form, "date")
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .ok_or("Enter the date as YYYY-MM-DD.")?;

    Ok(SaleFields {
        product_id,
        qty,
        price,
        date,
    })
}

/// Render the sale listing, newest first.
///
/// GET /sales
#[instrument(skip(state, session))]
async fn index(State(state): State<AppState>, session: Session) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::USER).await {
        return denied.into_response();
    }

    let sales = SaleRepository::new(state.pool())
        .list_with_product()
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to list sales");
            vec![]
        });

    let template = SalesIndexTemplate {
        title: "Sales",
        flash: take_flash(&session).await,
        sales,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Render the add form.
///
/// GET /sales/add
#[instrument(skip(state, session))]
async fn add_page(State(state): State<AppState>, session: Session) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::USER).await {
        return denied.into_response();
    }

    let template = SalesAddTemplate {
        title: "Add Sale",
        flash: take_flash(&session).await,
        products: load_products(&state).await,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Record a sale and take the units out of stock.
///
/// POST /sales/add
///
/// Redirects back to the entry form so several sales can be recorded in a
/// row.
#[instrument(skip(state, session, form))]
async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<FormData>,
) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::USER).await {
        return denied.into_response();
    }

    if let Err(redirect) = SALE_FLOW.validate(&session, &form, "/sales/add").await {
        return redirect.into_response();
    }

    let fields = match parse_sale_fields(&form) {
        Ok(fields) => fields,
        Err(reason) => {
            flash(&session, Severity::Danger, reason).await;
            return Redirect::to("/sales/add").into_response();
        }
    };

    let products = ProductRepository::new(state.pool());
    match products.find_by_id(fields.product_id).await {
        Ok(Some(_)) => {}
        _ => {
            flash(&session, Severity::Danger, "Missing Product id.").await;
            return Redirect::to("/sales/add").into_response();
        }
    }

    let outcome = SaleRepository::new(state.pool())
        .create(fields.product_id, fields.qty, fields.price, fields.date)
        .await
        .map(|_| true);
    if matches!(outcome, Ok(true))
        && let Err(err) = products.take_stock(fields.product_id, fields.qty).await
    {
        tracing::error!(error = %err, "failed to adjust stock after sale");
    }

    SALE_FLOW
        .finish(
            &session,
            outcome,
            "Sale added.",
            "/sales/add",
            "Sorry, failed to add the sale.",
            "/sales/add",
        )
        .await
        .into_response()
}

/// Render the edit form.
///
/// GET /sales/{id}/edit
#[instrument(skip(state, session))]
async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::USER).await {
        return denied.into_response();
    }

    let store = RecordStore::new(state.pool());
    if let Err(redirect) = SALE_FLOW.resolve(&store, &session, id).await {
        return redirect.into_response();
    }
    let sale = match SaleRepository::new(state.pool()).find_by_id(SaleId::new(id)).await {
        Ok(Some(sale)) => sale,
        _ => return Redirect::to("/sales").into_response(),
    };

    let template = SalesEditTemplate {
        title: "Edit Sale",
        flash: take_flash(&session).await,
        sale,
        products: load_products(&state).await,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Update a sale, adjusting stock by the quantity delta.
///
/// POST /sales/{id}/edit
#[instrument(skip(state, session, form))]
async fn edit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<FormData>,
) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::USER).await {
        return denied.into_response();
    }

    let store = RecordStore::new(state.pool());
    let record = match SALE_FLOW.resolve(&store, &session, id).await {
        Ok(record) => record,
        Err(redirect) => return redirect.into_response(),
    };

    let back = format!("/sales/{}/edit", record.id());
    if let Err(redirect) = SALE_FLOW.validate(&session, &form, &back).await {
        return redirect.into_response();
    }

    let fields = match parse_sale_fields(&form) {
        Ok(fields) => fields,
        Err(reason) => {
            flash(&session, Severity::Danger, reason).await;
            return Redirect::to(&back).into_response();
        }
    };

    let repo = SaleRepository::new(state.pool());
    let previous = match repo.find_by_id(SaleId::new(record.id())).await {
        Ok(Some(sale)) => sale,
        _ => return Redirect::to("/sales").into_response(),
    };

    let outcome = repo
        .update(
            previous.id,
            fields.product_id,
            fields.qty,
            fields.price,
            fields.date,
        )
        .await;
    if matches!(outcome, Ok(true)) {
        // Only the change in quantity moves stock; re-saving the same
        // quantity leaves it alone.
        let delta = fields.qty - previous.qty;
        if delta != 0
            && let Err(err) = ProductRepository::new(state.pool())
                .take_stock(fields.product_id, delta)
                .await
        {
            tracing::error!(error = %err, "failed to adjust stock after sale edit");
        }
    }

    let redirect = match outcome {
        Ok(true) => {
            flash(&session, Severity::Success, "Sale updated.").await;
            Redirect::to(&back)
        }
        Ok(false) => {
            flash(&session, Severity::Danger, "Sorry, failed to update the sale.").await;
            Redirect::to("/sales")
        }
        Err(err) => {
            tracing::error!(error = %err, "sale update failed");
            flash(&session, Severity::Danger, "Sorry, failed to update the sale.").await;
            Redirect::to("/sales")
        }
    };
    redirect.into_response()
}

/// Delete a sale.
///
/// GET /sales/{id}/delete
#[instrument(skip(state, session))]
async fn delete(State(state): State<AppState>, session: Session, Path(id): Path<i64>) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::USER).await {
        return denied.into_response();
    }

    let store = RecordStore::new(state.pool());
    SALE_FLOW
        .delete(&store, &session, id, "Sale deleted.", "Sale deletion failed.")
        .await
        .into_response()
}
