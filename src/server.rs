//! A small HTTP server offering a health check and on-demand report triggers.

use crate::pipeline::ReportPipeline;
use crate::Result;
use anyhow::Context;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{header, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// The report pipelines the trigger endpoints run.
#[derive(Clone)]
pub struct Triggers {
    live: ReportPipeline,
    mocked: ReportPipeline,
}

impl Triggers {
    pub fn new(live: ReportPipeline, mocked: ReportPipeline) -> Self {
        Self { live, mocked }
    }

    /// Produces the response for `method` and `path`.
    ///
    /// - `GET /health` answers `{"status":"ok"}`
    /// - `GET /test-report` runs the live report
    /// - `GET /test-report/mocked-data` runs the report over fixture data
    pub async fn respond(&self, method: &Method, path: &str) -> Response<Full<Bytes>> {
        match (method, path) {
            (&Method::GET, "/health") => json(StatusCode::OK, r#"{"status":"ok"}"#),
            (&Method::GET, "/test-report") => match self.live.generate_and_send_report().await {
                Ok(_) => text(StatusCode::OK, "Test report generated and sent!".to_string()),
                Err(e) => {
                    error!("Error generating report: {e}");
                    text(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Error generating report: {e}"),
                    )
                }
            },
            (&Method::GET, "/test-report/mocked-data") => {
                match self.mocked.generate_and_send_report().await {
                    Ok(_) => text(
                        StatusCode::OK,
                        "Test mocked report generated and sent!".to_string(),
                    ),
                    Err(e) => {
                        error!("Error generating mocked report: {e}");
                        text(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            format!("Error generating mocked report: {e}"),
                        )
                    }
                }
            }
            (_, "/health" | "/test-report" | "/test-report/mocked-data") => text(
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed".to_string(),
            ),
            _ => text(StatusCode::NOT_FOUND, "Not found".to_string()),
        }
    }

    async fn handle(&self, request: Request<Incoming>) -> Response<Full<Bytes>> {
        debug!("{} {}", request.method(), request.uri());
        self.respond(request.method(), request.uri().path()).await
    }
}

/// Binds `addr` and serves requests until the task is dropped or binding fails.
pub async fn serve(addr: SocketAddr, triggers: Triggers) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Unable to listen on {addr}"))?;
    info!("Financial report service listening on http://{addr}");
    accept_loop(listener, Arc::new(triggers)).await
}

async fn accept_loop(listener: TcpListener, triggers: Arc<Triggers>) -> Result<()> {
    loop {
        let (stream, peer) = listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        let io = TokioIo::new(stream);
        let triggers = triggers.clone();

        tokio::spawn(async move {
            let service = service_fn(move |request| {
                let triggers = triggers.clone();
                async move { Ok::<_, Infallible>(triggers.handle(request).await) }
            });
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Connection from {peer} ended with error: {e}");
            }
        });
    }
}

fn json(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    respond_with(status, "application/json", Bytes::from_static(body.as_bytes()))
}

fn text(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    respond_with(status, "text/plain; charset=utf-8", Bytes::from(body))
}

fn respond_with(status: StatusCode, content_type: &str, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    if let Ok(value) = header::HeaderValue::from_str(content_type) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FinanceApi, FixtureFinanceApi, Operation};
    use crate::email::Dispatcher;
    use crate::pipeline::ReportSettings;
    use crate::render::Renderer;
    use crate::test::{template_dir, StubApi, TestMailer};
    use http_body_util::BodyExt;

    fn pipeline(source: Arc<dyn FinanceApi>, mailer: &TestMailer) -> ReportPipeline {
        ReportPipeline::new(
            source,
            Arc::new(Renderer::new(template_dir())),
            Dispatcher::new(mailer.transport(), "reports@example.com", None),
            ReportSettings {
                title: "Monthly Financial Report".into(),
                recipient: Some("me@example.com".into()),
            },
        )
    }

    async fn body(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn triggers(live: Arc<dyn FinanceApi>, mailer: &TestMailer) -> Triggers {
        Triggers::new(
            pipeline(live, mailer),
            pipeline(Arc::new(FixtureFinanceApi), mailer),
        )
    }

    #[tokio::test]
    async fn test_health() {
        let mailer = TestMailer::new();
        let triggers = triggers(Arc::new(StubApi::new(1, 2)), &mailer);
        let response = triggers.respond(&Method::GET, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, r#"{"status":"ok"}"#);
        assert_eq!(mailer.attempts(), 0);
    }

    #[tokio::test]
    async fn test_mocked_report() {
        let mailer = TestMailer::new();
        let triggers = triggers(
            Arc::new(StubApi::new(1, 2).failing(Operation::MonthlySpending)),
            &mailer,
        );
        let response = triggers
            .respond(&Method::GET, "/test-report/mocked-data")
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, "Test mocked report generated and sent!");
        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_live_report_failure_is_500() {
        let mailer = TestMailer::new();
        let triggers = triggers(
            Arc::new(StubApi::new(1, 2).failing(Operation::AccountBalances)),
            &mailer,
        );
        let response = triggers.respond(&Method::GET, "/test-report").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let text = body(response).await;
        assert!(text.starts_with("Error generating report: Failed to fetch account balances"));
        assert_eq!(mailer.attempts(), 0);
    }

    #[tokio::test]
    async fn test_live_report() {
        let mailer = TestMailer::new();
        let triggers = triggers(Arc::new(StubApi::new(1, 2)), &mailer);
        let response = triggers.respond(&Method::GET, "/test-report").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, "Test report generated and sent!");
    }

    #[tokio::test]
    async fn test_unknown_path_and_method() {
        let mailer = TestMailer::new();
        let triggers = triggers(Arc::new(StubApi::new(1, 2)), &mailer);
        let response = triggers.respond(&Method::GET, "/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = triggers.respond(&Method::POST, "/test-report").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(mailer.attempts(), 0);
    }

    #[tokio::test]
    async fn test_serve_over_tcp() {
        let mailer = TestMailer::new();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(accept_loop(
            listener,
            Arc::new(triggers(Arc::new(StubApi::new(1, 2)), &mailer)),
        ));

        let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.text().await.unwrap(), r#"{"status":"ok"}"#);

        server.abort();
    }
}
