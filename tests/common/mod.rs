//! Shared fixture: a small teams service the integration tests drive end
//! to end through the public API.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use http::Method;
use serde_json::{json, Value};
use typeroute::{
    EndpointDef, EndpointResolver, ErrorStatus, HandlerBinding, HandlerCall, HandlerError,
    ParamSlot, ResourceDef, ResponseHandlerRegistry, RouterConfig, RouterService, ServeOutcome,
    ServerRequest, ServerResponse,
};

pub const JSON: &str = "application/json";
pub const TEAM_MODEL: &str = "urn:example:team";
pub const TEAM_LIST_MODEL: &str = "urn:example:teamlist";

static TRACING: Once = Once::new();

/// Install a test subscriber once; verbosity follows `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

fn arg_value(call: &HandlerCall<'_>, index: usize) -> Value {
    call.arg(index)
        .and_then(|arg| arg.as_value())
        .cloned()
        .unwrap_or(Value::Null)
}

fn get_team(call: &mut HandlerCall<'_>) -> Result<Value, HandlerError> {
    Ok(json!({
        "type": arg_value(call, 0),
        "name": arg_value(call, 1),
    }))
}

fn update_team(call: &mut HandlerCall<'_>) -> Result<Value, HandlerError> {
    let name = arg_value(call, 1);
    let team = arg_value(call, 2);
    if team.get("locked").and_then(Value::as_bool).unwrap_or(false) {
        return Err(HandlerError::new(
            "RosterConflict",
            "roster is locked for the season",
        ));
    }
    if team.get("disband").and_then(Value::as_bool).unwrap_or(false) {
        // No status mapping exists for this kind.
        return Err(HandlerError::new("Disbanded", "team no longer exists"));
    }
    if let Some(body_name) = team.get("name").and_then(Value::as_str) {
        if Some(body_name) != name.as_str() {
            return Err(HandlerError::validation(
                "name in the body must match the path",
                ["name"],
            ));
        }
    }
    Ok(json!({ "name": name, "team": team }))
}

fn create_team(call: &mut HandlerCall<'_>) -> Result<Value, HandlerError> {
    let team = arg_value(call, 1);
    call.response().set_status(201);
    Ok(team)
}

fn reset_teams(call: &mut HandlerCall<'_>) -> Result<Value, HandlerError> {
    call.response().set_status(204);
    Ok(Value::Null)
}

fn list_teams(_call: &mut HandlerCall<'_>) -> Result<Value, HandlerError> {
    Ok(json!({ "teams": ["Cubs", "White Sox"] }))
}

fn list_team_names(_call: &mut HandlerCall<'_>) -> Result<Value, HandlerError> {
    Ok(json!(["Cubs", "White Sox"]))
}

fn search_teams(call: &mut HandlerCall<'_>) -> Result<Value, HandlerError> {
    Ok(json!({
        "league": arg_value(call, 0),
        "page": arg_value(call, 1),
    }))
}

fn echo_terminus(call: &mut HandlerCall<'_>) -> Result<Value, HandlerError> {
    let terminus = call
        .arg(0)
        .and_then(|arg| arg.as_terminus())
        .unwrap_or("")
        .to_string();
    Ok(json!({ "terminus": terminus }))
}

fn crash(_call: &mut HandlerCall<'_>) -> Result<Value, HandlerError> {
    panic!("simulated handler crash");
}

/// The fixture resource set: a teams service exercising every slot kind,
/// both model-constrained and plain producers, and an error-status map.
pub fn resources() -> Vec<ResourceDef> {
    vec![ResourceDef::new("/teams")
        .with_endpoint(
            EndpointDef::new(Method::GET, "/{type}/{name}", "teams.get", Arc::new(get_team))
                .with_binding(HandlerBinding::new(vec![
                    ParamSlot::path("type", "string"),
                    ParamSlot::path("name", "string"),
                ])),
        )
        .with_endpoint(
            EndpointDef::new(
                Method::PUT,
                "/{type}/{name}",
                "teams.update",
                Arc::new(update_team),
            )
            .with_request_format(JSON)
            .with_request_model(TEAM_MODEL)
            .with_binding(HandlerBinding::new(vec![
                ParamSlot::path("type", "string"),
                ParamSlot::path("name", "string"),
                ParamSlot::Body,
            ]))
            .with_error_status(ErrorStatus::new("RosterConflict", 409).with_code("ROSTER_FULL"))
            .with_error_status(ErrorStatus::new("FieldValidation", 400)),
        )
        .with_endpoint(
            EndpointDef::new(Method::POST, "/{type}", "teams.create", Arc::new(create_team))
                .with_request_format(JSON)
                .with_binding(HandlerBinding::new(vec![
                    ParamSlot::path("type", "string"),
                    ParamSlot::Body,
                ])),
        )
        .with_endpoint(
            EndpointDef::new(Method::GET, "/all", "teams.list", Arc::new(list_teams))
                .with_response_model(TEAM_LIST_MODEL),
        )
        .with_endpoint(EndpointDef::new(
            Method::GET,
            "/all",
            "teams.list_plain",
            Arc::new(list_team_names),
        ))
        .with_endpoint(EndpointDef::new(
            Method::DELETE,
            "/all",
            "teams.reset",
            Arc::new(reset_teams),
        ))
        .with_endpoint(
            EndpointDef::new(Method::GET, "/search", "teams.search", Arc::new(search_teams))
                .with_binding(HandlerBinding::new(vec![
                    ParamSlot::required_query("league", "string"),
                    ParamSlot::query("page", "i32"),
                ])),
        )
        .with_endpoint(
            EndpointDef::new(Method::GET, "/echo", "teams.echo", Arc::new(echo_terminus))
                .with_binding(HandlerBinding::new(vec![ParamSlot::Terminus])),
        )
        .with_endpoint(EndpointDef::new(
            Method::GET,
            "/crash",
            "teams.crash",
            Arc::new(crash),
        ))]
}

pub fn service() -> RouterService {
    service_with(RouterConfig::default())
}

pub fn service_with(config: RouterConfig) -> RouterService {
    init_tracing();
    let registry = ResponseHandlerRegistry::with_json_defaults();
    let table = EndpointResolver::new(registry, config.clone())
        .resolve(resources())
        .expect("fixture registration is valid");
    RouterService::with_config(table, config)
}

pub fn send(service: &RouterService, mut request: ServerRequest) -> (ServeOutcome, ServerResponse) {
    let mut response = ServerResponse::new();
    let outcome = service.handle(&mut request, &mut response);
    (outcome, response)
}

pub fn get(
    service: &RouterService,
    target: &str,
    accept: Option<&str>,
) -> (ServeOutcome, ServerResponse) {
    let mut request = ServerRequest::new(Method::GET, target);
    if let Some(accept) = accept {
        request = request.with_header("Accept", accept);
    }
    send(service, request)
}

pub fn body_json(response: &ServerResponse) -> Value {
    serde_json::from_slice(response.body()).expect("response body is JSON")
}
