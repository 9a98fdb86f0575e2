use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder, Scope};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::use_cases::chart_config::{ChartConfigGenerator, ChartOptions};
use crate::application::use_cases::chart_recommender::{
    ChartKind, ChartRecommendation, ChartRecommender, DataSummary, ModelRecommender,
    RuleBasedRecommender,
};
use crate::application::use_cases::table_pipeline::{TableMetadata, TablePipeline};
use crate::domain::app_config::AppConfig;
use crate::domain::error::{PipelineError, PipelineStage};
use crate::domain::table::ColumnInfo;
use crate::infrastructure::llm_client::OpenAiCompatibleClient;

pub struct HttpState {
    pub pipeline: Arc<TablePipeline>,
    pub recommender: Arc<dyn ChartRecommender>,
}

impl HttpState {
    /// State with the rule-based recommender
    pub fn new(pipeline: Arc<TablePipeline>) -> Self {
        Self {
            pipeline,
            recommender: Arc::new(RuleBasedRecommender::new()),
        }
    }

    /// Swap in another recommender, e.g. one backed by a language model
    pub fn with_recommender(mut self, recommender: Arc<dyn ChartRecommender>) -> Self {
        self.recommender = recommender;
        self
    }
}

#[derive(Deserialize)]
struct UploadQuery {
    filename: String,
}

#[derive(Serialize)]
struct UploadResponse<'a> {
    recommendations: Vec<ChartRecommendation>,
    data: Vec<serde_json::Map<String, serde_json::Value>>,
    columns: &'a [ColumnInfo],
    metadata: &'a TableMetadata,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartConfigRequest {
    chart_type: String,
    #[serde(default)]
    data: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    columns: Vec<ColumnInfo>,
    #[serde(default)]
    config: ChartOptions,
}

#[derive(Serialize)]
struct ChartTypeInfo {
    id: ChartKind,
    label: &'static str,
    label_zh: &'static str,
    description: &'static str,
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": Local::now().to_rfc3339(),
    }))
}

#[get("/charts/types")]
async fn chart_types() -> impl Responder {
    let types: Vec<ChartTypeInfo> = ChartKind::ALL
        .iter()
        .map(|kind| ChartTypeInfo {
            id: *kind,
            label: kind.label(),
            label_zh: kind.label_zh(),
            description: kind.description(),
        })
        .collect();
    HttpResponse::Ok().json(types)
}

#[post("/charts/config")]
async fn chart_config(request: web::Json<ChartConfigRequest>) -> impl Responder {
    let request = request.into_inner();
    let kind = ChartKind::match_label(&request.chart_type).unwrap_or_else(|| {
        warn!(chart = %request.chart_type, "Unknown chart type, using a column chart");
        ChartKind::Column
    });
    let config =
        ChartConfigGenerator::new().generate(kind, &request.data, &request.columns, &request.config);
    HttpResponse::Ok().json(config)
}

#[post("/upload")]
async fn upload(
    data: web::Data<HttpState>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> impl Responder {
    let request_id = Uuid::new_v4();
    let filename = query.into_inner().filename;
    info!(%request_id, file = %filename, size = body.len(), "Upload received");

    let pipeline = data.pipeline.clone();
    let file = filename.clone();
    let joined = tokio::task::spawn_blocking(move || pipeline.process(&body, &file)).await;

    let table = match joined {
        Ok(Ok(table)) => table,
        Ok(Err(err)) => return pipeline_error_response(&err),
        Err(e) => {
            error!(%request_id, file = %filename, "Pipeline worker failed: {}", e);
            return HttpResponse::InternalServerError()
                .json(json!({ "error": "processing worker failed", "stage": null }));
        }
    };

    let summary = DataSummary::from_dataset(&table.dataset);
    let recommendations = match data.recommender.recommend(&summary).await {
        Ok(recs) => recs,
        Err(e) => {
            warn!(%request_id, "Recommender failed, using rule-based fallback: {}", e);
            RuleBasedRecommender::new().recommend_for(&summary)
        }
    };

    info!(
        %request_id,
        file = %filename,
        rows = table.metadata.rows_count,
        recommendations = recommendations.len(),
        "Upload processed"
    );

    HttpResponse::Ok().json(UploadResponse {
        recommendations,
        data: table.dataset.to_records(),
        columns: table.dataset.columns(),
        metadata: &table.metadata,
    })
}

/// Problems with the upload itself are 400s; everything else is a server fault
fn pipeline_error_response(err: &PipelineError) -> HttpResponse {
    let body = json!({ "error": err.error.to_string(), "stage": err.stage });
    if err.error.is_user_facing() {
        HttpResponse::BadRequest().json(body)
    } else if err.stage == PipelineStage::StructureInference {
        // A file with no content is still the client's problem
        HttpResponse::UnprocessableEntity().json(body)
    } else {
        error!(stage = %err.stage, file = %err.file, "Processing failed: {}", err.error);
        HttpResponse::InternalServerError().json(body)
    }
}

fn api_scope() -> Scope {
    web::scope("/api")
        .service(health)
        .service(chart_types)
        .service(chart_config)
        .service(upload)
}

/// Body limit with headroom so oversized files reach the pipeline's own size check
fn payload_config(max_file_size_bytes: usize) -> web::PayloadConfig {
    web::PayloadConfig::new(max_file_size_bytes.saturating_mul(2))
}

pub fn start_server(config: AppConfig) -> std::io::Result<Server> {
    let AppConfig {
        server,
        pipeline,
        recommender,
    } = config;
    let payload_limit = pipeline.max_file_size_bytes;
    let pipeline = Arc::new(TablePipeline::new(Arc::new(pipeline)));
    let mut state = HttpState::new(pipeline);
    if recommender.is_enabled() {
        info!(model = %recommender.model, "Using model-backed chart recommendations");
        let client = OpenAiCompatibleClient::new(recommender).map_err(std::io::Error::other)?;
        state = state.with_recommender(Arc::new(ModelRecommender::new(Arc::new(client))));
    }
    let state = web::Data::new(state);

    info!(host = %server.host, port = server.port, "Starting HTTP server");

    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .app_data(payload_config(payload_limit))
            .service(api_scope())
    })
    .bind((server.host.as_str(), server.port))?
    .run();

    Ok(server)
}
