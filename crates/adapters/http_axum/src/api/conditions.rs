//! Condition expression parsing, for clients that edit conditions before
//! saving a routine.

use axum::Json;
use serde::{Deserialize, Serialize};

use soundboard_domain::routine::{AtomLabel, AtomTable, Condition, ConditionExpr};

use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ParseRequest {
    pub atoms: AtomTable,
    pub expression: String,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub expr: ConditionExpr,
    /// Canonical text of the parsed tree.
    pub normalized: String,
    pub labels: Vec<AtomLabel>,
}

/// `POST /api/conditions/parse` — parse an expression against a set of atoms.
pub async fn parse(Json(req): Json<ParseRequest>) -> Result<Json<ParseResponse>, ApiError> {
    let condition = Condition::parse(req.atoms, &req.expression)?;
    let expr = condition.expr().clone();
    Ok(Json(ParseResponse {
        normalized: expr.to_string(),
        labels: expr.labels().into_iter().collect(),
        expr,
    }))
}
