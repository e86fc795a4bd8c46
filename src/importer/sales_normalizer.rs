// ==========================================
// 分销商佣金计算系统 - 销售/参考数据归一化
// ==========================================
// 职责: 已解析的松散记录(JSON) → SalesRecord / DistributorInfo / CategoryInfo
// 红线: 任一销售记录格式错误 → 整批拒绝(不做部分计算)
// ==========================================

use crate::domain::sales::{CategoryInfo, DistributorInfo, SalesRecord};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldReader;
use chrono::NaiveDate;
use serde_json::Value;

// ===== 销售记录字段别名 =====
const DISTRIBUTOR_ID: &[&str] = &["distributorId", "distributor_id", "distributorCode", "soldToParty"];
const ARTICLE_ID: &[&str] = &["articleId", "article_id", "articleCode", "material"];
const QUANTITY: &[&str] = &["billingQuantity", "billing_quantity", "quantity", "qty"];
const NET_SALES: &[&str] = &["netSales", "net_sales", "netValue", "value"];
const DOCUMENT: &[&str] = &["billingDocument", "billing_document", "invoiceNo", "documentNo"];
const DATE: &[&str] = &["billingDate", "billing_date", "date"];
const YEAR: &[&str] = &["billingYear", "billing_year", "year"];
const MONTH: &[&str] = &["billingMonth", "billing_month", "month"];
const DAY: &[&str] = &["billingDay", "billing_day", "day"];

/// 归一化销售批次
///
/// # 返回
/// - Err(EmptySales): 输入为空
/// - Err(..): 首个格式错误的记录(行号从 1 开始)
pub fn normalize_sales(rows: &[Value]) -> ImportResult<Vec<SalesRecord>> {
    if rows.is_empty() {
        return Err(ImportError::EmptySales);
    }

    rows.iter()
        .enumerate()
        .map(|(index, row)| normalize_sale(row, index + 1))
        .collect()
}

/// 归一化单条销售记录
pub fn normalize_sale(row: &Value, row_number: usize) -> ImportResult<SalesRecord> {
    let reader = FieldReader::new(row, format!("row {}", row_number))?;

    Ok(SalesRecord {
        distributor_id: reader.required_string(DISTRIBUTOR_ID)?,
        article_id: reader.required_string(ARTICLE_ID)?,
        billing_quantity: reader.required_f64(QUANTITY)?,
        net_sales: reader.required_f64(NET_SALES)?,
        billing_document: reader.string(DOCUMENT).unwrap_or_default(),
        billing_date: parse_billing_date(&reader)?,
    })
}

/// 开票日期: 优先完整日期,否则由年/月/日拼装(日缺省为 1)
fn parse_billing_date(reader: &FieldReader<'_>) -> ImportResult<Option<NaiveDate>> {
    if let Some(date) = reader.date(DATE)? {
        return Ok(Some(date));
    }

    let (Some(year), Some(month)) = (reader.f64(YEAR)?, reader.f64(MONTH)?) else {
        return Ok(None);
    };
    let day = reader.f64(DAY)?.unwrap_or(1.0);

    NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .map(Some)
        .ok_or_else(|| ImportError::TypeConversionError {
            context: reader.context().to_string(),
            field: "billingDate".to_string(),
            message: format!("无效日期: {}-{}-{}", year, month, day),
        })
}

/// 归一化分销商参考数据
pub fn normalize_distributors(rows: &[Value]) -> ImportResult<Vec<DistributorInfo>> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let reader = FieldReader::new(row, format!("distributor {}", index + 1))?;
            Ok(DistributorInfo {
                distributor_id: reader.required_string(&["distributorId", "distributor_id", "id", "code"])?,
                zone: reader.string(&["zone"]),
                state: reader.string(&["state", "region"]),
                distributor_type: reader.string(&["distributorType", "distributor_type", "type"]),
            })
        })
        .collect()
}

/// 归一化物料类目参考数据
pub fn normalize_categories(rows: &[Value]) -> ImportResult<Vec<CategoryInfo>> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let reader = FieldReader::new(row, format!("category {}", index + 1))?;
            Ok(CategoryInfo {
                article_id: reader.required_string(&["articleId", "article_id", "id", "material"])?,
                family: reader.string(&["family", "articleFamily"]),
                class: reader.string(&["class", "articleClass"]),
                brand: reader.string(&["brand", "articleBrand"]),
            })
        })
        .collect()
}
