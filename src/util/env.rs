//! Environment-backed configuration.
//!
//! Variables load once into a process-wide [`Env`] and are read through the
//! [`Var`] enum via the `var!` macro, so a missing variable surfaces as a
//! single [`EnvErr`] at first access instead of a scattering of panics.

use std::sync::LazyLock;

use thiserror::Error;
use tokio::sync::OnceCell;

static ENV_VARS: LazyLock<OnceCell<Env>> = LazyLock::new(OnceCell::new);
pub async fn get_var(var: Var) -> EnvResult<&'static str> {
    let vars = ENV_VARS.get_or_try_init(|| async { Env::new() }).await?;
    Ok(match var {
        Var::LlmApiBase => &vars.llm_api_base,
        Var::LlmApiKey => &vars.llm_api_key,
        Var::LlmModel => &vars.llm_model,
        Var::InternalToken => &vars.internal_post_token,
        Var::RedisUrl => &vars.redis_url,
        Var::ServerApiPort => &vars.server_api_port,
        Var::OtelExporterEndpoint => &vars.otel_exporter_otlp_endpoint,
        Var::ApiServiceName => &vars.api_service_name,
        Var::ApiTracerName => &vars.api_tracer_name,
    })
}

#[derive(Debug, Clone)]
pub struct Env {
    pub llm_api_base: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub internal_post_token: String,
    pub redis_url: String,
    pub server_api_port: String,
    pub otel_exporter_otlp_endpoint: String,
    pub api_service_name: String,
    pub api_tracer_name: String,
}

impl Env {
    pub fn new() -> EnvResult<Self> {
        // .env is a dev convenience; deployed processes get real env vars
        dotenvy::dotenv().ok();

        Ok(Self {
            llm_api_base: required("LLM_API_BASE")?,
            llm_api_key: required("LLM_API_KEY")?,
            llm_model: required("LLM_MODEL")?,
            internal_post_token: required("INTERNAL_POST_TOKEN")?,
            redis_url: required("REDIS_URL")?,
            server_api_port: required("SERVER_API_PORT")?,
            otel_exporter_otlp_endpoint: required("OTEL_EXPORTER_OTLP_ENDPOINT")?,
            api_service_name: required("API_SERVICE_NAME")?,
            api_tracer_name: required("API_TRACER_NAME")?,
        })
    }
}

fn required(name: &'static str) -> EnvResult<String> {
    std::env::var(name).map_err(|_| EnvErr::MissingVar(name))
}

#[derive(Debug, Clone, Copy)]
pub enum Var {
    LlmApiBase,
    LlmApiKey,
    LlmModel,
    InternalToken,
    RedisUrl,
    ServerApiPort,
    OtelExporterEndpoint,
    ApiServiceName,
    ApiTracerName,
}

#[macro_export]
macro_rules! var {
    ($ev:expr) => {
        $crate::util::env::get_var($ev)
    };
}

pub type EnvResult<T> = core::result::Result<T, EnvErr>;

#[derive(Debug, Error)]
pub enum EnvErr {
    #[error("missing required environment variable '{0}'")]
    MissingVar(&'static str),
}
