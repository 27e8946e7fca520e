// src/web/routes.rs
use crate::{
    state::AppState,
    web::{
        auth_handlers, class_handlers, dashboard_handlers, invite_handlers, mw_auth, mw_role,
        mw_sync, school_handlers,
    },
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn create_router(app_state: AppState) -> Router {
    // --- Rotas Públicas ---
    let public_routes = Router::new()
        .route("/login", get(auth_handlers::show_login_form).post(auth_handlers::handle_login))
        .route("/register", get(auth_handlers::show_register_form).post(auth_handlers::handle_register))
        .route("/logout", get(auth_handlers::handle_logout))
        .route("/", get(|| async { axum::response::Redirect::to("/dashboard") }));

    // --- Escolas e utilizadores (super_admin) ---
    let school_routes = Router::new()
        .route("/", get(school_handlers::list_schools).post(school_handlers::create_school))
        .route("/{id}", get(school_handlers::show_school))
        .route("/{id}/users/{user_id}/toggle", post(school_handlers::toggle_user))
        .route("/{id}/users/{user_id}/delete", post(school_handlers::delete_user))
        .route(
            "/{id}/users/{user_id}/edit",
            get(school_handlers::show_edit_user).post(school_handlers::handle_edit_user),
        )
        .route_layer(middleware::from_fn(mw_role::require_super_admin));

    let invite_routes = Router::new()
        .route("/", get(invite_handlers::list_invites).post(invite_handlers::create_invite))
        .route("/remove", post(invite_handlers::remove_invite))
        .route_layer(middleware::from_fn(mw_role::require_super_admin));

    // --- Turmas e chamada (professor, gestor) ---
    let class_routes = Router::new()
        .route("/", get(class_handlers::list_classes))
        .route(
            "/{id}/attendance",
            get(class_handlers::show_attendance).post(class_handlers::save_attendance),
        )
        .route_layer(middleware::from_fn(mw_role::require_class_access));

    // --- Rotas Autenticadas ---
    // require_auth corre antes dos middlewares de perfil das rotas aninhadas
    let authenticated_routes = Router::new()
        .route("/dashboard", get(dashboard_handlers::show_dashboard))
        .nest("/schools", school_routes)
        .nest("/invites", invite_routes)
        .nest("/classes", class_routes)
        .route_layer(middleware::from_fn(mw_auth::require_auth));

    // --- Router Final ---
    // O estado da sincronização bloqueia todas as páginas, incluindo o login
    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_sync::require_sync_ready,
        ))
        .with_state(app_state)
}
