use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::model::ApplicationSet;

/// Emit the JSON Schema for ApplicationSet manifests.
pub fn application_set_json_schema() -> RootSchema {
    schema_for!(ApplicationSet)
}
