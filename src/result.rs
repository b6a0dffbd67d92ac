//! The decode output record and its wire shape.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeResult {
    pub student_id: String,
    pub id_double_shade_columns: Vec<u32>,
    pub answers: Vec<String>,
    pub multi_answer_questions: Vec<u32>,
    pub markers_found: bool,
}
