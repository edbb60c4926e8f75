//! MCP `ToolAnnotations` derived from the HTTP method behind each tool.

use rmcp::model::ToolAnnotations;
use unrelated_ns_api::Method;

/// Generate tool annotations from HTTP method semantics.
///
/// `openWorldHint` is always `true`: every tool talks to the remote platform. Reads are
/// read-only and idempotent; `POST` (agent login/logout) changes queue state but destroys
/// nothing.
#[must_use]
pub fn annotations_for_method(method: &Method) -> ToolAnnotations {
    let open_world_hint = Some(true);

    if method == Method::GET {
        return ToolAnnotations {
            title: None,
            read_only_hint: Some(true),
            destructive_hint: Some(false),
            idempotent_hint: Some(true),
            open_world_hint,
        };
    }

    if method == Method::POST {
        return ToolAnnotations {
            title: None,
            read_only_hint: Some(false),
            destructive_hint: Some(false),
            idempotent_hint: Some(false),
            open_world_hint,
        };
    }

    ToolAnnotations {
        title: None,
        read_only_hint: None,
        destructive_hint: None,
        idempotent_hint: None,
        open_world_hint,
    }
}
