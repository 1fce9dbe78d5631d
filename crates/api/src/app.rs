use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{
    BuiltinTemplates, Collaborators, GroupDirectory, InvitationWorkflow,
    InviteSettings, MailSender, PlaceholderTranslator, PreferenceStore, TokenService,
    UserDirectory,
};
use persistence::repositories::{PgGroupDirectory, PgPreferenceStore, PgUserDirectory};
use shared::jwt::{JwtConfig, JwtError};
use shared::random::RandomGenerator;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{Config, ServerConfig};
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{health, invites};
use crate::services::{EmailService, RouteLinks, SystemSettings};

#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<InvitationWorkflow>,
    pub groups: Arc<dyn GroupDirectory>,
    pub jwt: Arc<JwtConfig>,
    pub admin_group: String,
    /// Present when the stores are backed by PostgreSQL.
    pub pool: Option<PgPool>,
}

/// The account, group and preference stores the workflow runs against.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserDirectory>,
    pub groups: Arc<dyn GroupDirectory>,
    pub preferences: Arc<dyn PreferenceStore>,
}

impl Stores {
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            users: Arc::new(PgUserDirectory::new(pool.clone())),
            groups: Arc::new(PgGroupDirectory::new(pool.clone())),
            preferences: Arc::new(PgPreferenceStore::new(pool.clone())),
        }
    }
}

impl AppState {
    /// Wires the workflow from configuration, the given stores and a mail transport.
    pub fn new(
        config: &Config,
        stores: Stores,
        mailer: Arc<dyn MailSender>,
        pool: Option<PgPool>,
    ) -> Result<Self, JwtError> {
        let jwt = config.auth.jwt_config()?;
        let settings = Arc::new(SystemSettings::from_config(&config.invite));

        let tokens = TokenService::with_generator(
            RandomGenerator::default(),
            config.invite.token_length,
            settings.clone(),
            stores.preferences.clone(),
        );

        let collaborators = Collaborators {
            users: stores.users,
            groups: stores.groups.clone(),
            preferences: stores.preferences,
            links: Arc::new(RouteLinks::for_invites(
                &config.invite.base_url,
                &config.invite.join_path,
            )),
            templates: Arc::new(BuiltinTemplates::new()),
            mailer,
            config: settings,
            translator: Arc::new(PlaceholderTranslator),
        };

        let workflow = InvitationWorkflow::with_tokens(
            collaborators,
            InviteSettings {
                product_name: config.invite.product_name.clone(),
            },
            tokens,
        );

        Ok(Self {
            workflow: Arc::new(workflow),
            groups: stores.groups,
            jwt: Arc::new(jwt),
            admin_group: config.invite.admin_group.clone(),
            pool,
        })
    }
}

/// Builds the production application on a PostgreSQL pool.
pub fn create_app(config: Config, pool: PgPool) -> Result<Router, JwtError> {
    let mailer = Arc::new(EmailService::new(config.email.clone()));
    let state = AppState::new(&config, Stores::postgres(&pool), mailer, Some(pool))?;
    Ok(create_router(state, &config.server))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let invite_routes = Router::new()
        .route("/api/v1/invites", post(invites::create_invite))
        .route(
            "/api/v1/invites/join",
            get(invites::check_token).post(invites::join),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(invite_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(server.max_body_size))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&server.cors_origins))
        .with_state(state)
}
