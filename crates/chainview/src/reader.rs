//! 链上计划读取器
//!
//! 通过 RPC 调用 PlanRegistry.getPlanInfo，并把返回的原始结构
//! 解码为类型化的记录。

use crate::abi::PlanRegistry;
use crate::error::{ChainviewError, ChainviewResult};
use crate::types::{
    InspectionRecord, PlanInfo, PlanRecord, TaskRecord, TaskStatus, parse_meta,
};
use alloy::primitives::Address;
use alloy::providers::ProviderBuilder;
use tracing::debug;
use url::Url;

/// 计划读取器
///
/// Provider 在每次请求时重建，读取器本身只持有 RPC 端点。
#[derive(Clone, Debug)]
pub struct PlanReader {
    rpc_url: Url,
}

impl PlanReader {
    /// 从 RPC URL 字符串创建读取器
    pub fn new(rpc_url: &str) -> ChainviewResult<Self> {
        let rpc_url = rpc_url
            .parse::<Url>()
            .map_err(|e| ChainviewError::Config(format!("Invalid RPC URL {rpc_url:?}: {e}")))?;

        Ok(Self { rpc_url })
    }

    /// 读取指定合约的完整计划信息
    pub async fn fetch_plan(&self, address: Address) -> ChainviewResult<PlanInfo> {
        debug!("Fetching plan info from contract {}", address);

        let provider = ProviderBuilder::new().on_http(self.rpc_url.clone());
        let contract = PlanRegistry::new(address, provider);

        let result = contract
            .getPlanInfo()
            .call()
            .await
            .map_err(|e| ChainviewError::Rpc(format!("getPlanInfo call failed: {e}")))?;

        let plan = decode_plan(result.plan)?;
        let tasks = result
            .tasks
            .into_iter()
            .map(decode_task)
            .collect::<ChainviewResult<Vec<_>>>()?;
        let inspections = result
            .inspections
            .into_iter()
            .map(decode_inspection)
            .collect::<ChainviewResult<Vec<_>>>()?;

        debug!(
            "Decoded plan info: {} tasks, {} inspections",
            tasks.len(),
            inspections.len()
        );

        Ok(PlanInfo {
            plan,
            tasks,
            inspections,
        })
    }
}

fn decode_plan(raw: PlanRegistry::PlanData) -> ChainviewResult<PlanRecord> {
    let meta = parse_meta(&raw.metadata, "plan")?;

    Ok(PlanRecord {
        crop: raw.crop,
        variety: raw.variety,
        planted_at: raw.plantedAt,
        harvest_at: raw.harvestAt,
        expected_yield_kg: raw.expectedYieldKg,
        expert: raw.expert,
        meta,
    })
}

fn decode_task(raw: PlanRegistry::TaskData) -> ChainviewResult<TaskRecord> {
    let status = TaskStatus::try_from(raw.status)?;
    let meta = parse_meta(&raw.metadata, "task")?;

    Ok(TaskRecord {
        name: raw.name,
        scheduled_at: raw.scheduledAt,
        status,
        meta,
    })
}

fn decode_inspection(raw: PlanRegistry::InspectionData) -> ChainviewResult<InspectionRecord> {
    let meta = parse_meta(&raw.metadata, "inspection")?;

    Ok(InspectionRecord {
        inspector: raw.inspector,
        inspected_at: raw.inspectedAt,
        passed: raw.passed,
        meta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_rejects_invalid_url() {
        let result = PlanReader::new("not a url");
        assert!(matches!(result, Err(ChainviewError::Config(_))));
    }

    #[test]
    fn test_decode_plan_with_metadata() {
        let raw = PlanRegistry::PlanData {
            crop: "rice".to_string(),
            variety: "jasmine".to_string(),
            plantedAt: 1_700_000_000,
            harvestAt: 1_710_000_000,
            expectedYieldKg: 5000,
            expert: "Dr. Chen".to_string(),
            metadata: r#"{"location": "Yunnan"}"#.to_string(),
        };

        let record = decode_plan(raw).unwrap();
        assert_eq!(record.crop, "rice");
        assert_eq!(record.expected_yield_kg, 5000);
        assert_eq!(record.meta.unwrap().location.as_deref(), Some("Yunnan"));
    }

    #[test]
    fn test_decode_plan_without_metadata() {
        let raw = PlanRegistry::PlanData {
            crop: "tea".to_string(),
            variety: "oolong".to_string(),
            plantedAt: 0,
            harvestAt: 0,
            expectedYieldKg: 0,
            expert: String::new(),
            metadata: String::new(),
        };

        let record = decode_plan(raw).unwrap();
        assert!(record.meta.is_none());
    }

    #[test]
    fn test_decode_task_status() {
        let raw = PlanRegistry::TaskData {
            name: "fertilize".to_string(),
            scheduledAt: 1_705_000_000,
            status: 1,
            metadata: String::new(),
        };

        let record = decode_task(raw).unwrap();
        assert_eq!(record.status, TaskStatus::InProgress);
    }

    #[test]
    fn test_decode_task_unknown_status_fails() {
        let raw = PlanRegistry::TaskData {
            name: "fertilize".to_string(),
            scheduledAt: 0,
            status: 99,
            metadata: String::new(),
        };

        assert!(matches!(
            decode_task(raw),
            Err(ChainviewError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_inspection_bad_metadata_fails() {
        let raw = PlanRegistry::InspectionData {
            inspector: "inspector-1".to_string(),
            inspectedAt: 1_706_000_000,
            passed: true,
            metadata: "{broken".to_string(),
        };

        assert!(matches!(
            decode_inspection(raw),
            Err(ChainviewError::Decode(_))
        ));
    }
}
