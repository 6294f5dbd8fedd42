//! Wire format of the REST backend.
//!
//! The backend speaks Spanish field names and is inconsistent in a few
//! places (`prioridad` as bool or 0/1, `created_at` vs `createdAt`). All of
//! that is normalized here so the rest of the crate only sees core types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::service_type::ServiceType;
use crate::table::{Table, TableStatus};
use crate::ticket::{Ticket, TicketStatus};
use crate::validation::{
    CreateServiceTypeRequest, CreateTableRequest, CreateTicketRequest, UpdateServiceTypeRequest,
    UpdateTableRequest,
};

use super::BackendError;

/// Response envelope used by every backend endpoint.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

fn default_success() -> bool {
    true
}

/// Ticket listings come either paginated or as a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TicketList {
    Paged { turnos: Vec<TurnoDto> },
    Plain(Vec<TurnoDto>),
}

impl TicketList {
    pub fn into_vec(self) -> Vec<TurnoDto> {
        match self {
            TicketList::Paged { turnos } => turnos,
            TicketList::Plain(turnos) => turnos,
        }
    }
}

/// Boolean that the backend may also send as `0`/`1` or `"0"`/`"1"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LooseFlag {
    Bool(bool),
    Int(i64),
    Text(String),
}

fn loose_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let flag: Option<LooseFlag> = Option::deserialize(deserializer)?;
    Ok(match flag {
        None => false,
        Some(LooseFlag::Bool(b)) => b,
        Some(LooseFlag::Int(n)) => n != 0,
        Some(LooseFlag::Text(s)) => matches!(s.trim(), "1" | "true"),
    })
}

fn loose_flag_default_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let flag: Option<LooseFlag> = Option::deserialize(deserializer)?;
    Ok(match flag {
        None => true,
        Some(LooseFlag::Bool(b)) => b,
        Some(LooseFlag::Int(n)) => n != 0,
        Some(LooseFlag::Text(s)) => matches!(s.trim(), "1" | "true"),
    })
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct TurnoDto {
    pub id: String,
    pub codigo: String,
    pub tipo_servicio_id: String,
    #[serde(default)]
    pub mesa_id: Option<String>,
    pub estado: String,
    #[serde(default, deserialize_with = "loose_flag")]
    pub prioridad: bool,
    #[serde(default)]
    pub nombre_cliente: Option<String>,
    #[serde(default)]
    pub observaciones: Option<String>,
    #[serde(default)]
    pub hora_llamado: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hora_atencion: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hora_finalizacion: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "createdAt")]
    pub created_at_camel: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "updatedAt")]
    pub updated_at_camel: Option<DateTime<Utc>>,
}

pub fn ticket_status_from_wire(estado: &str) -> Result<TicketStatus, BackendError> {
    match estado {
        "en_espera" => Ok(TicketStatus::Waiting),
        "en_atencion" => Ok(TicketStatus::Serving),
        "completado" => Ok(TicketStatus::Completed),
        "cancelado" => Ok(TicketStatus::Cancelled),
        other => Err(BackendError::Decode(format!("unknown ticket status '{}'", other))),
    }
}

pub fn ticket_status_to_wire(status: TicketStatus) -> &'static str {
    match status {
        TicketStatus::Waiting => "en_espera",
        TicketStatus::Serving => "en_atencion",
        TicketStatus::Completed => "completado",
        TicketStatus::Cancelled => "cancelado",
    }
}

impl TryFrom<TurnoDto> for Ticket {
    type Error = BackendError;

    fn try_from(dto: TurnoDto) -> Result<Self, Self::Error> {
        let status = ticket_status_from_wire(&dto.estado)?;
        let created_at = dto.created_at.or(dto.created_at_camel).ok_or_else(|| {
            BackendError::Decode(format!("ticket '{}' has no creation time", dto.id))
        })?;
        let updated_at = dto.updated_at.or(dto.updated_at_camel).unwrap_or(created_at);
        Ok(Ticket {
            id: dto.id,
            code: dto.codigo,
            service_type_id: dto.tipo_servicio_id,
            table_id: dto.mesa_id.filter(|id| !id.is_empty()),
            status,
            is_priority: dto.prioridad,
            customer_name: dto.nombre_cliente,
            notes: dto.observaciones,
            created_at,
            called_at: dto.hora_llamado,
            attended_at: dto.hora_atencion,
            completed_at: dto.hora_finalizacion,
            updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct MesaDto {
    pub id: String,
    pub numero: u32,
    pub nombre: String,
    pub estado: String,
    #[serde(default = "default_true", deserialize_with = "loose_flag_default_true")]
    pub activo: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "createdAt")]
    pub created_at_camel: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "updatedAt")]
    pub updated_at_camel: Option<DateTime<Utc>>,
}

pub fn table_status_from_wire(estado: &str) -> Result<TableStatus, BackendError> {
    match estado {
        "disponible" => Ok(TableStatus::Available),
        "ocupada" => Ok(TableStatus::Occupied),
        "inactiva" => Ok(TableStatus::Inactive),
        other => Err(BackendError::Decode(format!("unknown table status '{}'", other))),
    }
}

pub fn table_status_to_wire(status: TableStatus) -> &'static str {
    match status {
        TableStatus::Available => "disponible",
        TableStatus::Occupied => "ocupada",
        TableStatus::Inactive => "inactiva",
    }
}

impl TryFrom<MesaDto> for Table {
    type Error = BackendError;

    fn try_from(dto: MesaDto) -> Result<Self, Self::Error> {
        Ok(Table {
            status: table_status_from_wire(&dto.estado)?,
            id: dto.id,
            number: dto.numero,
            name: dto.nombre,
            active: dto.activo,
            created_at: dto.created_at.or(dto.created_at_camel),
            updated_at: dto.updated_at.or(dto.updated_at_camel),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TipoServicioDto {
    pub id: String,
    pub nombre: String,
    pub codigo: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    pub color: String,
    pub tiempo_estimado: u32,
    #[serde(default = "default_true", deserialize_with = "loose_flag_default_true")]
    pub activo: bool,
}

impl From<TipoServicioDto> for ServiceType {
    fn from(dto: TipoServicioDto) -> Self {
        ServiceType {
            id: dto.id,
            name: dto.nombre,
            code: dto.codigo,
            description: dto.descripcion,
            color: dto.color,
            estimated_duration_minutes: dto.tiempo_estimado,
            active: dto.activo,
        }
    }
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CreateTurnoBody<'a> {
    pub tipo_servicio_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre_cliente: Option<&'a str>,
    pub prioridad: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<&'a str>,
}

impl<'a> From<&'a CreateTicketRequest> for CreateTurnoBody<'a> {
    fn from(request: &'a CreateTicketRequest) -> Self {
        Self {
            tipo_servicio_id: &request.service_type_id,
            nombre_cliente: request.customer_name.as_deref(),
            prioridad: request.is_priority,
            observaciones: request.notes.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LlamarBody<'a> {
    pub mesa_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ObservacionesBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct MesaBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activo: Option<bool>,
}

impl<'a> From<&'a CreateTableRequest> for MesaBody<'a> {
    fn from(request: &'a CreateTableRequest) -> Self {
        Self {
            numero: Some(request.number),
            nombre: Some(request.name.trim()),
            estado: request.status.map(table_status_to_wire),
            activo: request.active,
        }
    }
}

impl<'a> From<&'a UpdateTableRequest> for MesaBody<'a> {
    fn from(request: &'a UpdateTableRequest) -> Self {
        Self {
            numero: request.number,
            nombre: request.name.as_deref().map(str::trim),
            estado: request.status.map(table_status_to_wire),
            activo: request.active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ServicioBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codigo: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiempo_estimado: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activo: Option<bool>,
}

impl<'a> From<&'a CreateServiceTypeRequest> for ServicioBody<'a> {
    fn from(request: &'a CreateServiceTypeRequest) -> Self {
        Self {
            nombre: Some(request.name.trim()),
            codigo: Some(&request.code),
            descripcion: request.description.as_deref(),
            color: Some(&request.color),
            tiempo_estimado: Some(request.estimated_duration_minutes),
            activo: Some(request.active),
        }
    }
}

impl<'a> From<&'a UpdateServiceTypeRequest> for ServicioBody<'a> {
    fn from(request: &'a UpdateServiceTypeRequest) -> Self {
        Self {
            nombre: request.name.as_deref().map(str::trim),
            codigo: request.code.as_deref(),
            descripcion: request.description.as_deref(),
            color: request.color.as_deref(),
            tiempo_estimado: request.estimated_duration_minutes,
            activo: request.active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn turno(prioridad: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "t1",
            "codigo": "CAJ-001",
            "tipo_servicio_id": "svc",
            "estado": "en_espera",
            "prioridad": prioridad,
            "created_at": "2026-03-02T09:00:00Z"
        })
    }

    fn decode(value: serde_json::Value) -> Ticket {
        let dto: TurnoDto = serde_json::from_value(value).unwrap();
        Ticket::try_from(dto).unwrap()
    }

    #[test]
    fn test_priority_accepts_bool_and_numeric_encodings() {
        assert!(decode(turno(json!(true))).is_priority);
        assert!(decode(turno(json!(1))).is_priority);
        assert!(decode(turno(json!("1"))).is_priority);
        assert!(!decode(turno(json!(false))).is_priority);
        assert!(!decode(turno(json!(0))).is_priority);
        assert!(!decode(turno(json!(null))).is_priority);
    }

    #[test]
    fn test_missing_priority_is_false() {
        let mut value = turno(json!(true));
        value.as_object_mut().unwrap().remove("prioridad");
        assert!(!decode(value).is_priority);
    }

    #[test]
    fn test_created_at_camel_case_alias() {
        let value = json!({
            "id": "t1",
            "codigo": "CAJ-001",
            "tipo_servicio_id": "svc",
            "estado": "en_atencion",
            "mesa_id": "M1",
            "createdAt": "2026-03-02T09:00:00Z",
            "hora_llamado": "2026-03-02T09:05:00Z"
        });
        let ticket = decode(value);
        assert_eq!(ticket.status, TicketStatus::Serving);
        assert_eq!(ticket.table_id.as_deref(), Some("M1"));
        assert_eq!(ticket.updated_at, ticket.created_at);
        assert!(ticket.called_at.is_some());
    }

    #[test]
    fn test_both_timestamp_spellings_present() {
        let mut value = turno(json!(false));
        value["createdAt"] = json!("2026-03-02T08:00:00Z");
        value["updated_at"] = json!("2026-03-02T09:10:00Z");
        value["updatedAt"] = json!("2026-03-02T09:20:00Z");

        let ticket = decode(value);
        assert_eq!(ticket.created_at.to_rfc3339(), "2026-03-02T09:00:00+00:00");
        assert_eq!(ticket.updated_at.to_rfc3339(), "2026-03-02T09:10:00+00:00");
    }

    #[test]
    fn test_missing_creation_time_is_decode_error() {
        let mut value = turno(json!(false));
        value.as_object_mut().unwrap().remove("created_at");
        let dto: TurnoDto = serde_json::from_value(value).unwrap();
        assert!(matches!(Ticket::try_from(dto), Err(BackendError::Decode(_))));
    }

    #[test]
    fn test_mesa_with_both_timestamp_spellings() {
        let dto: MesaDto = serde_json::from_value(json!({
            "id": "M1",
            "numero": 1,
            "nombre": "Mesa 1",
            "estado": "disponible",
            "created_at": "2026-03-01T08:00:00Z",
            "createdAt": "2026-03-01T08:00:00Z",
            "updatedAt": "2026-03-02T08:00:00Z"
        }))
        .unwrap();
        let table = Table::try_from(dto).unwrap();
        assert!(table.created_at.is_some());
        assert!(table.updated_at.is_some());
    }

    #[test]
    fn test_unknown_ticket_status_is_decode_error() {
        let mut value = turno(json!(false));
        value["estado"] = json!("perdido");
        let dto: TurnoDto = serde_json::from_value(value).unwrap();
        assert!(matches!(Ticket::try_from(dto), Err(BackendError::Decode(_))));
    }

    #[test]
    fn test_status_wire_names_roundtrip() {
        for status in TicketStatus::ALL {
            assert_eq!(
                ticket_status_from_wire(ticket_status_to_wire(status)).unwrap(),
                status
            );
        }
    }

    #[test]
    fn test_ticket_list_paged_and_plain() {
        let paged: TicketList = serde_json::from_value(json!({
            "turnos": [turno(json!(false))],
            "pagination": {"total": 1, "page": 1, "limit": 50, "totalPages": 1}
        }))
        .unwrap();
        assert_eq!(paged.into_vec().len(), 1);

        let plain: TicketList = serde_json::from_value(json!([turno(json!(false))])).unwrap();
        assert_eq!(plain.into_vec().len(), 1);
    }

    #[test]
    fn test_mesa_decoding() {
        let dto: MesaDto = serde_json::from_value(json!({
            "id": "M1",
            "numero": 1,
            "nombre": "Mesa 1",
            "estado": "ocupada",
            "activo": 1
        }))
        .unwrap();
        let table = Table::try_from(dto).unwrap();
        assert_eq!(table.status, TableStatus::Occupied);
        assert!(table.active);
    }

    #[test]
    fn test_mesa_activo_defaults_true() {
        let dto: MesaDto = serde_json::from_value(json!({
            "id": "M1", "numero": 1, "nombre": "Mesa 1", "estado": "disponible"
        }))
        .unwrap();
        assert!(dto.activo);
    }

    #[test]
    fn test_servicio_decoding() {
        let dto: TipoServicioDto = serde_json::from_value(json!({
            "id": "s1",
            "nombre": "Caja",
            "codigo": "CAJ",
            "color": "#FF0000",
            "tiempo_estimado": 5,
            "activo": false
        }))
        .unwrap();
        let service = ServiceType::from(dto);
        assert_eq!(service.estimated_duration_minutes, 5);
        assert!(!service.active);
    }

    #[test]
    fn test_envelope_without_data() {
        let envelope: Envelope<serde_json::Value> =
            serde_json::from_value(json!({"success": false, "message": "Mesa no encontrada"}))
                .unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.message, "Mesa no encontrada");
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_create_turno_body() {
        let request = CreateTicketRequest {
            service_type_id: "svc".to_string(),
            customer_name: None,
            is_priority: true,
            notes: None,
        };
        let body = serde_json::to_value(CreateTurnoBody::from(&request)).unwrap();
        assert_eq!(body, json!({"tipo_servicio_id": "svc", "prioridad": true}));
    }

    #[test]
    fn test_update_mesa_body_only_sends_present_fields() {
        let update = UpdateTableRequest {
            status: Some(TableStatus::Inactive),
            ..Default::default()
        };
        let body = serde_json::to_value(MesaBody::from(&update)).unwrap();
        assert_eq!(body, json!({"estado": "inactiva"}));
    }
}
