//! authpair server library
//!
//! Paired access/refresh token authentication: the credential core in
//! [`auth`], user persistence behind [`store::UserStore`], and a thin axum
//! layer in [`routes`], [`handlers`] and [`middleware`].

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
