//! 链上计划数据的类型化表示
//!
//! 合约返回的原始结构在边界处全部转换为显式 schema：
//! - 数值状态码映射为 TaskStatus 枚举，未知值直接报错
//! - metadata JSON 字符串解析为对应的 Meta 结构，空字符串视为无元数据

use crate::error::{ChainviewError, ChainviewResult};
use serde::{Deserialize, Serialize};

/// 任务状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TryFrom<u8> for TaskStatus {
    type Error = ChainviewError;

    fn try_from(value: u8) -> ChainviewResult<Self> {
        match value {
            0 => Ok(TaskStatus::Pending),
            1 => Ok(TaskStatus::InProgress),
            2 => Ok(TaskStatus::Completed),
            other => Err(ChainviewError::Decode(format!(
                "Unknown task status code: {other}"
            ))),
        }
    }
}

/// 计划元数据（合约 metadata 字段内嵌的 JSON）
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PlanMeta {
    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub certification: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

/// 任务元数据
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TaskMeta {
    #[serde(default)]
    pub assignee: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

/// 检查元数据
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct InspectionMeta {
    #[serde(default)]
    pub report_url: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

/// 解析 metadata JSON 字符串
///
/// 空字符串表示链上未填写元数据，返回 None；
/// 非空但无法解析的内容是数据错误，向上报告。
pub fn parse_meta<T: for<'de> Deserialize<'de>>(raw: &str, kind: &str) -> ChainviewResult<Option<T>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| ChainviewError::Decode(format!("Invalid {kind} metadata JSON: {e}")))
}

/// 计划记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanRecord {
    pub crop: String,
    pub variety: String,

    /// 种植时间（Unix 秒）
    #[serde(rename = "plantedAt")]
    pub planted_at: u64,

    /// 预计收获时间（Unix 秒）
    #[serde(rename = "harvestAt")]
    pub harvest_at: u64,

    /// 预计产量（千克）
    #[serde(rename = "expectedYieldKg")]
    pub expected_yield_kg: u64,

    pub expert: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PlanMeta>,
}

/// 任务记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    pub name: String,

    #[serde(rename = "scheduledAt")]
    pub scheduled_at: u64,

    pub status: TaskStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<TaskMeta>,
}

/// 检查记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InspectionRecord {
    pub inspector: String,

    #[serde(rename = "inspectedAt")]
    pub inspected_at: u64,

    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<InspectionMeta>,
}

/// 完整的计划信息响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanInfo {
    pub plan: PlanRecord,
    pub tasks: Vec<TaskRecord>,
    pub inspections: Vec<InspectionRecord>,
}
