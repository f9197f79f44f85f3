//! HTTP route handlers for the admin panel.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Health check
//!
//! # Auth
//! GET  /                        - Redirect to login
//! GET  /login                   - Login page
//! POST /login                   - Password sign-in
//! GET  /logout                  - Sign out
//!
//! # Dashboard
//! GET  /admin                   - Admin dashboard (tiles, top sellers)
//! GET  /home                    - Landing page for the lowest tier
//!
//! # Groups (level 1)
//! GET  /groups                  - Group listing
//! GET  /groups/add              - Add form
//! POST /groups/add              - Create group
//! GET  /groups/{id}/edit        - Edit form
//! POST /groups/{id}/edit        - Update group
//! GET  /groups/{id}/delete      - Delete group
//!
//! # Users (level 1)
//! GET  /users                   - User listing
//! GET  /users/add               - Add form
//! POST /users/add               - Create account
//! GET  /users/{id}/edit         - Edit form
//! POST /users/{id}/edit         - Update account
//! GET  /users/{id}/delete       - Delete account
//!
//! # Account (signed-in)
//! GET  /profile/{id}            - Profile page
//! GET  /account/edit            - Edit own profile
//! POST /account/edit            - Update own profile
//! GET  /account/password        - Change password form
//! POST /account/password        - Change password
//!
//! # Categories (level 1)
//! GET  /categories              - Listing + inline add form
//! POST /categories              - Create category
//! GET  /categories/{id}/edit    - Edit form
//! POST /categories/{id}/edit    - Update category
//! GET  /categories/{id}/delete  - Delete category
//!
//! # Products (level 2)
//! GET  /products                - Product listing
//! GET  /products/add            - Add form
//! POST /products/add            - Create product
//! GET  /products/{id}/edit      - Edit form
//! POST /products/{id}/edit      - Update product
//! GET  /products/{id}/delete    - Delete product
//!
//! # Media (level 2)
//! GET  /media                   - Gallery + upload form
//! POST /media                   - Upload photo
//! GET  /media/{id}/delete       - Delete photo
//!
//! # Sales (level 3)
//! GET  /sales                   - Sale listing
//! GET  /sales/add               - Add form
//! POST /sales/add               - Record sale
//! GET  /sales/{id}/edit         - Edit form
//! POST /sales/{id}/edit         - Update sale
//! GET  /sales/{id}/delete       - Delete sale
//!
//! # Reports (level 2)
//! GET  /reports/sales           - Date-range form
//! POST /reports/sales           - Range report
//! GET  /reports/daily           - Current month, per day
//! GET  /reports/monthly         - Current year, per month
//! ```

use axum::Router;
use axum::http::Uri;

use crate::error::AppError;
use crate::state::AppState;

pub mod account;
pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod groups;
pub mod media;
pub mod products;
pub mod reports;
pub mod sales;
pub mod users;

/// Build the full route table.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(groups::router())
        .merge(users::router())
        .merge(account::router())
        .merge(categories::router())
        .merge(products::router())
        .merge(media::router())
        .merge(sales::router())
        .merge(reports::router())
        .fallback(not_found)
}

/// Unmatched paths get the standard not-found response.
async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_owned())
}
