//! Dashboard route handlers.
//!
//! The admin dashboard shows count tiles through the generic record store
//! plus the highest-selling and most recent activity; `/home` is the
//! landing page for the lowest permission tier.

use askama::Template;
use axum::{
    Router,
    extract::State,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tower_sessions::Session;
use tracing::instrument;

use storeroom_core::Level;

use crate::db::{Collection, ProductRepository, RecordStore, SaleRepository};
use crate::filters;
use crate::middleware::{RequireAuth, require_level};
use crate::models::{Flash, SaleWithProduct, TopSeller, take_flash};
use crate::state::AppState;

/// Count tiles at the top of the dashboard.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tiles {
    pub users: i64,
    pub categories: i64,
    pub products: i64,
    pub sales: i64,
}

/// Recently added product view for the dashboard.
#[derive(Debug, Clone)]
pub struct RecentProduct {
    pub name: String,
    pub categorie: String,
    pub sale_price: String,
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard/index.html")]
struct DashboardTemplate {
    title: &'static str,
    flash: Option<Flash>,
    user_name: String,
    tiles: Tiles,
    top_sellers: Vec<TopSeller>,
    recent_products: Vec<RecentProduct>,
    recent_sales: Vec<SaleWithProduct>,
}

/// Landing page template.
#[derive(Template)]
#[template(path = "dashboard/home.html")]
struct HomeTemplate {
    title: &'static str,
    flash: Option<Flash>,
    user_name: String,
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin))
        .route("/home", get(home))
}

/// Render the admin dashboard.
///
/// GET /admin
#[instrument(skip(state, session))]
async fn admin(State(state): State<AppState>, session: Session) -> Response {
    let user = match require_level(state.pool(), &session, Level::ADMIN).await {
        Ok(user) => user,
        Err(denied) => return denied.into_response(),
    };

    let store = RecordStore::new(state.pool());
    let mut tiles = Tiles::default();
    for (collection, slot) in [
        (Collection::Users, &mut tiles.users),
        (Collection::Categories, &mut tiles.categories),
        (Collection::Products, &mut tiles.products),
        (Collection::Sales, &mut tiles.sales),
    ] {
        match store.count(collection).await {
            Ok(count) => *slot = count,
            Err(err) => tracing::error!(error = %err, %collection, "failed to count"),
        }
    }

    let products = ProductRepository::new(state.pool());
    let top_sellers = products.top_sellers(10).await.unwrap_or_else(|err| {
        tracing::error!(error = %err, "failed to load top sellers");
        vec![]
    });
    let recent_products = products
        .find_recent(5)
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to load recent products");
            vec![]
        })
        .into_iter()
        .map(|detail| RecentProduct {
            name: detail.product.name,
            categorie: detail.categorie.unwrap_or_default(),
            sale_price: detail.product.sale_price.to_string(),
        })
        .collect();
    let recent_sales = SaleRepository::new(state.pool())
        .find_recent(5)
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to load recent sales");
            vec![]
        });

    let template = DashboardTemplate {
        title: "Dashboard",
        flash: take_flash(&session).await,
        user_name: user.name,
        tiles,
        top_sellers,
        recent_products,
        recent_sales,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Render the landing page.
///
/// GET /home
///
/// Denied requests land here, so the page itself only asks for a signed-in
/// identity; a level floor would bounce a denied visitor right back.
#[instrument(skip(session))]
async fn home(RequireAuth(current): RequireAuth, session: Session) -> Response {
    let template = HomeTemplate {
        title: "Home",
        flash: take_flash(&session).await,
        user_name: current.name,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}
