//! 种植计划合约 ABI 定义
//!
//! 合约的 getPlanInfo 返回固定的三元组：计划主体、任务列表、检查列表。
//! metadata 字段是合约内嵌的 JSON 字符串，由 types 模块做二次解析。

use alloy::sol;

sol! {
    /// 种植计划登记合约
    #[sol(rpc)]
    contract PlanRegistry {
        /// 计划主体
        struct PlanData {
            string crop;
            string variety;
            uint64 plantedAt;
            uint64 harvestAt;
            uint64 expectedYieldKg;
            string expert;
            string metadata;
        }

        /// 生产任务
        struct TaskData {
            string name;
            uint64 scheduledAt;
            uint8 status;
            string metadata;
        }

        /// 质检记录
        struct InspectionData {
            string inspector;
            uint64 inspectedAt;
            bool passed;
            string metadata;
        }

        function getPlanInfo()
            external
            view
            returns (PlanData plan, TaskData[] memory tasks, InspectionData[] memory inspections);
    }
}
