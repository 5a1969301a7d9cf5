use std::collections::BTreeMap;

use poem_openapi::Object;

#[derive(Object, Debug)]
pub struct HealthDto {
    /// Failing dependency name mapped to its error messages; empty when healthy.
    pub errors: BTreeMap<String, Vec<String>>,
}
