// ==========================================
// 分销商佣金计算系统 - Commission Core 纯函数库
// ==========================================
// 职责: 阶梯费率解析、佣金公式计算
// 红线: 无状态、无副作用、无 I/O
// ==========================================

use crate::domain::scheme::Slab;
use crate::domain::types::{CommissionType, RateSource, SlabType};

pub struct CommissionCore;

impl CommissionCore {
    /// 阶梯比较值
    ///
    /// # 规则
    /// - Quantity → |total_quantity|
    /// - Value → |total_value|
    pub fn comparison_value(slab_type: SlabType, total_quantity: f64, total_value: f64) -> f64 {
        match slab_type {
            SlabType::Quantity => total_quantity.abs(),
            SlabType::Value => total_value.abs(),
        }
    }

    /// 阶梯费率解析
    ///
    /// # 规则
    /// 1. 阶梯按 min 升序
    /// 2. 首个 [min, max] 闭区间包含比较值的阶梯胜出(first-match)
    /// 3. 无区间命中 → 取 min ≤ 比较值 的最大 min 阶梯(highest-reached)
    /// 4. 比较值低于所有下限 → 费率 0
    ///
    /// # 返回
    /// - (f64, RateSource): 费率 + 来源(slab_index 为升序后的位置)
    pub fn resolve_slab_rate(slabs: &[Slab], value: f64) -> (f64, RateSource) {
        let mut ordered: Vec<&Slab> = slabs.iter().collect();
        ordered.sort_by(|a, b| a.min.total_cmp(&b.min));

        if let Some((slab_index, slab)) = ordered
            .iter()
            .enumerate()
            .find(|(_, slab)| slab.contains(value))
        {
            return (slab.rate, RateSource::SlabMatch { slab_index });
        }

        // 升序下最后一个 min ≤ value 的阶梯即最大已达到阶梯
        match ordered
            .iter()
            .enumerate()
            .rev()
            .find(|(_, slab)| slab.min <= value)
        {
            Some((slab_index, slab)) => (slab.rate, RateSource::SlabHighestReached { slab_index }),
            None => (0.0, RateSource::NoSlab),
        }
    }

    /// 按佣金类型计算分组佣金
    ///
    /// # 规则
    /// - Fixed → rate(与数量无关)
    /// - AbsolutePerUnit → rate × total_quantity
    /// - Percentage → rate% × total_value
    pub fn apply_commission_type(
        commission_type: CommissionType,
        rate: f64,
        total_quantity: f64,
        total_value: f64,
    ) -> f64 {
        match commission_type {
            CommissionType::Fixed => rate,
            CommissionType::AbsolutePerUnit => rate * total_quantity,
            CommissionType::Percentage => rate / 100.0 * total_value,
        }
    }
}
