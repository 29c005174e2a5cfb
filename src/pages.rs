//! Demo pages — one per policy, each echoing the fields bound for it.

use ambient_server::policy::{ALLOW_EMPTY_POLICY, PARENT_ID_REQUIRED_POLICY, PARTIAL_POLICY};
use ambient_server::{AmbientRouter, CurrentContext, FromAmbientContext, Hid, Pid, RouteRequirement};
use axum::{Json, routing::get};
use serde_json::{Value, json};

/// Register the demo pages on a fresh router.
pub fn register(router: AmbientRouter) -> AmbientRouter {
    router
        .route("/", get(index))
        .guarded_route("/Secure", RouteRequirement::new(), get(secure))
        .guarded_route("/PartialContext", RouteRequirement::with_policy(PARTIAL_POLICY), get(partial))
        .guarded_route(
            "/ParentRequired",
            RouteRequirement::with_policy(PARENT_ID_REQUIRED_POLICY),
            get(parent_required),
        )
        .guarded_route("/AllowEmpty", RouteRequirement::with_policy(ALLOW_EMPTY_POLICY), get(allow_empty))
}

async fn index() -> Json<Value> {
    Json(json!({
        "pages": ["/Secure", "/PartialContext", "/ParentRequired", "/AllowEmpty"],
    }))
}

async fn secure(CurrentContext(context): CurrentContext) -> Json<Value> {
    Json(json!({
        "page": "Secure",
        "context": context,
    }))
}

async fn partial(hid: FromAmbientContext<Hid>, pid: FromAmbientContext<Pid>) -> Json<Value> {
    page("PartialContext", hid, pid)
}

async fn parent_required(hid: FromAmbientContext<Hid>, pid: FromAmbientContext<Pid>) -> Json<Value> {
    page("ParentRequired", hid, pid)
}

async fn allow_empty(hid: FromAmbientContext<Hid>, pid: FromAmbientContext<Pid>) -> Json<Value> {
    page("AllowEmpty", hid, pid)
}

fn page(name: &str, hid: FromAmbientContext<Hid>, pid: FromAmbientContext<Pid>) -> Json<Value> {
    Json(json!({
        "page": name,
        "hid": hid.value(),
        "pid": pid.value(),
    }))
}
