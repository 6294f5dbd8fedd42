//! REST backend implementation.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::metrics;
use crate::service_type::ServiceType;
use crate::table::Table;
use crate::ticket::{Ticket, Transition};
use crate::validation::{
    CreateServiceTypeRequest, CreateTableRequest, CreateTicketRequest, UpdateServiceTypeRequest,
    UpdateTableRequest,
};

use super::wire::{
    ticket_status_to_wire, CreateTurnoBody, Envelope, LlamarBody, MesaBody, MesaDto,
    ObservacionesBody, ServicioBody, TicketList, TipoServicioDto, TurnoDto,
};
use super::{Backend, BackendError, TicketQuery};

/// Backend reached over HTTP.
pub struct RestBackend {
    client: Client,
    base_url: String,
}

impl RestBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::ConnectionFailed(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Send a request and unwrap the response envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Option<T>, BackendError> {
        let start = Instant::now();
        let result = self.send_inner(request).await;

        metrics::BACKEND_REQUEST_DURATION
            .with_label_values(&[operation])
            .observe(start.elapsed().as_secs_f64());
        let status = if result.is_ok() { "success" } else { "error" };
        metrics::BACKEND_REQUESTS
            .with_label_values(&[operation, status])
            .inc();

        match &result {
            Ok(_) => debug!(operation, "Backend request succeeded"),
            Err(e) => warn!(operation, error = %e, "Backend request failed"),
        }

        result
    }

    async fn send_inner<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, BackendError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = read_body(response).await?;

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(BackendError::Decode(e.to_string()));
            }
            Err(_) => {
                return Err(BackendError::api(
                    status.as_u16(),
                    format!(
                        "HTTP {}: {}",
                        status,
                        body.chars().take(200).collect::<String>()
                    ),
                ));
            }
        };

        if !status.is_success() || !envelope.success {
            let message = if envelope.message.is_empty() {
                format!("HTTP {}", status)
            } else {
                envelope.message
            };
            return Err(BackendError::Api {
                status: Some(status.as_u16()),
                message,
            });
        }

        Ok(envelope.data)
    }

    async fn send_data<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        self.send(operation, request)
            .await?
            .ok_or_else(|| BackendError::Decode(format!("{}: response has no data", operation)))
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        self.send_data(operation, self.request(method, path).json(body))
            .await
    }
}

fn map_transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else if e.is_connect() {
        BackendError::ConnectionFailed(e.to_string())
    } else {
        BackendError::Api {
            status: None,
            message: e.to_string(),
        }
    }
}

async fn read_body(response: Response) -> Result<String, BackendError> {
    response.text().await.map_err(map_transport_error)
}

fn encode(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

fn tickets_path(query: &TicketQuery) -> String {
    let mut params = Vec::new();
    if let Some(status) = query.status {
        params.push(format!("estado={}", ticket_status_to_wire(status)));
    }
    if let Some(service) = &query.service_type_id {
        params.push(format!("tipo_servicio_id={}", encode(service)));
    }
    if params.is_empty() {
        "/turnos".to_string()
    } else {
        format!("/turnos?{}", params.join("&"))
    }
}

fn transition_request<'a>(id: &str, transition: &'a Transition) -> (String, TransitionBody<'a>) {
    let id = encode(id);
    match transition {
        Transition::Call { table_id } => (
            format!("/turnos/{}/llamar", id),
            TransitionBody::Call(LlamarBody { mesa_id: table_id }),
        ),
        Transition::Complete { notes } => (
            format!("/turnos/{}/completar", id),
            TransitionBody::Notes(ObservacionesBody {
                observaciones: notes.as_deref(),
            }),
        ),
        Transition::Cancel { notes } => (
            format!("/turnos/{}/cancelar", id),
            TransitionBody::Notes(ObservacionesBody {
                observaciones: notes.as_deref(),
            }),
        ),
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum TransitionBody<'a> {
    Call(LlamarBody<'a>),
    Notes(ObservacionesBody<'a>),
}

#[async_trait]
impl Backend for RestBackend {
    fn name(&self) -> &str {
        "rest"
    }

    async fn list_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>, BackendError> {
        let list: TicketList = self
            .send_data("list_tickets", self.request(Method::GET, &tickets_path(query)))
            .await?;
        list.into_vec().into_iter().map(Ticket::try_from).collect()
    }

    async fn create_ticket(&self, request: &CreateTicketRequest) -> Result<Ticket, BackendError> {
        let dto: TurnoDto = self
            .send_json(
                "create_ticket",
                Method::POST,
                "/turnos",
                &CreateTurnoBody::from(request),
            )
            .await?;
        Ticket::try_from(dto)
    }

    async fn transition(
        &self,
        ticket_id: &str,
        transition: &Transition,
    ) -> Result<Ticket, BackendError> {
        let (path, body) = transition_request(ticket_id, transition);
        let dto: TurnoDto = self
            .send_json(transition.kind().as_str(), Method::PUT, &path, &body)
            .await?;
        Ticket::try_from(dto)
    }

    async fn list_tables(&self) -> Result<Vec<Table>, BackendError> {
        let dtos: Vec<MesaDto> = self
            .send_data("list_tables", self.request(Method::GET, "/mesas"))
            .await?;
        dtos.into_iter().map(Table::try_from).collect()
    }

    async fn create_table(&self, request: &CreateTableRequest) -> Result<Table, BackendError> {
        let dto: MesaDto = self
            .send_json("create_table", Method::POST, "/mesas", &MesaBody::from(request))
            .await?;
        Table::try_from(dto)
    }

    async fn update_table(
        &self,
        id: &str,
        request: &UpdateTableRequest,
    ) -> Result<Table, BackendError> {
        let dto: MesaDto = self
            .send_json(
                "update_table",
                Method::PUT,
                &format!("/mesas/{}", encode(id)),
                &MesaBody::from(request),
            )
            .await?;
        Table::try_from(dto)
    }

    async fn delete_table(&self, id: &str) -> Result<(), BackendError> {
        self.send::<serde_json::Value>(
            "delete_table",
            self.request(Method::DELETE, &format!("/mesas/{}", encode(id))),
        )
        .await
        .map(|_| ())
    }

    async fn list_service_types(&self) -> Result<Vec<ServiceType>, BackendError> {
        let dtos: Vec<TipoServicioDto> = self
            .send_data("list_service_types", self.request(Method::GET, "/servicios"))
            .await?;
        Ok(dtos.into_iter().map(ServiceType::from).collect())
    }

    async fn create_service_type(
        &self,
        request: &CreateServiceTypeRequest,
    ) -> Result<ServiceType, BackendError> {
        let dto: TipoServicioDto = self
            .send_json(
                "create_service_type",
                Method::POST,
                "/servicios",
                &ServicioBody::from(request),
            )
            .await?;
        Ok(dto.into())
    }

    async fn update_service_type(
        &self,
        id: &str,
        request: &UpdateServiceTypeRequest,
    ) -> Result<ServiceType, BackendError> {
        let dto: TipoServicioDto = self
            .send_json(
                "update_service_type",
                Method::PUT,
                &format!("/servicios/{}", encode(id)),
                &ServicioBody::from(request),
            )
            .await?;
        Ok(dto.into())
    }

    async fn delete_service_type(&self, id: &str) -> Result<(), BackendError> {
        self.send::<serde_json::Value>(
            "delete_service_type",
            self.request(Method::DELETE, &format!("/servicios/{}", encode(id))),
        )
        .await
        .map(|_| ())
    }
}
