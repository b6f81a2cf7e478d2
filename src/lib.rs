pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use crate::services::{
    auth_service::AuthService, classifier::ClassifierService,
    generation_service::{CompletionBackend, GenerationService},
    question_service::QuestionService, result_service::ResultService,
    store::PgVariationStore, test_service::TestService, variation_service::VariationService,
};
use reqwest::Client;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub auth_service: AuthService,
    pub test_service: TestService,
    pub question_service: QuestionService,
    pub result_service: ResultService,
    pub classifier: ClassifierService,
    pub variation_service: VariationService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");

        let generation = GenerationService::new(
            config.generation_api_key.clone(),
            config.generation_api_url.clone(),
            config.generation_model.clone(),
            Some(http_client),
        );
        let completion: Arc<dyn CompletionBackend> = Arc::new(generation);
        let store = Arc::new(PgVariationStore::new(pool.clone()));

        let auth_service = AuthService::new(pool.clone());
        let test_service = TestService::new(pool.clone());
        let question_service = QuestionService::new(pool.clone());
        let result_service = ResultService::new(pool.clone());
        let classifier = ClassifierService::new(completion.clone());
        let variation_service = VariationService::new(completion, store);

        Self {
            pool,
            auth_service,
            test_service,
            question_service,
            result_service,
            classifier,
            variation_service,
        }
    }
}
