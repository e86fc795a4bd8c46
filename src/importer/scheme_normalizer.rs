// ==========================================
// 分销商佣金计算系统 - 方案归一化
// ==========================================
// 职责: 松散方案 JSON(多别名/字符串枚举) → 严格 Scheme
// 输出: Scheme (阶梯已按 min 升序)
// ==========================================

use crate::domain::scheme::{
    ArticleHierarchyFilter, ArticleSelection, DistributorCriteria, DistributorSelection, Scheme,
    SchemeRule, Slab,
};
use crate::domain::types::{CommissionType, SlabType};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{normalize_token, FieldReader};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

// ===== 字段别名 =====
const ID: &[&str] = &["schemeId", "scheme_id", "id", "_id"];
const NAME: &[&str] = &["schemeName", "scheme_name", "name"];
const SCHEME_TYPE: &[&str] = &["schemeType", "scheme_type", "type"];
const COMMISSION_TYPE: &[&str] = &["commissionType", "commission_type"];
const DISTRIBUTOR_MODE: &[&str] = &["distributorSelection", "distributor_selection", "distributorMode"];
const DISTRIBUTOR_IDS: &[&str] = &["distributorIds", "distributor_ids", "distributors"];
const ZONE: &[&str] = &["zone", "distributorZone"];
const STATE: &[&str] = &["state", "distributorState"];
const DISTRIBUTOR_TYPE: &[&str] = &["distributorType", "distributor_type"];
const ARTICLE_IDS: &[&str] = &["articleIds", "article_ids", "articles"];
const OTHER_ARTICLE_IDS: &[&str] = &["otherArticleIds", "other_article_ids", "otherArticles"];
const FAMILIES: &[&str] = &["families", "family", "articleFamily"];
const CLASSES: &[&str] = &["classes", "class", "articleClass"];
const BRANDS: &[&str] = &["brands", "brand", "articleBrand"];
const SLABS: &[&str] = &["slabs", "boosterSlabs", "booster_slabs"];
const SLAB_TYPE: &[&str] = &["slabType", "slab_type"];
const ARTICLE_COMMISSIONS: &[&str] = &["articleCommissions", "article_commissions", "commissions"];

const SLAB_MIN: &[&str] = &["min", "from", "minValue"];
const SLAB_MAX: &[&str] = &["max", "to", "maxValue"];
const SLAB_RATE: &[&str] = &["rate", "commission", "value"];
const ENTRY_ARTICLE: &[&str] = &["articleId", "article_id", "article"];
const ENTRY_RATE: &[&str] = &["commission", "rate", "value"];

/// 归一化单个方案
pub fn normalize_scheme(raw: &Value) -> ImportResult<Scheme> {
    let reader = FieldReader::new(raw, "scheme")?;

    let scheme_id = reader.required_string(ID)?;
    let scheme_name = reader.string(NAME).unwrap_or_else(|| scheme_id.clone());
    let commission_type = parse_commission_type(&reader.required_string(COMMISSION_TYPE)?)?;
    let type_token = normalize_token(&reader.required_string(SCHEME_TYPE)?);

    let rule = match type_token.as_str() {
        "article" | "articletable" | "articlewise" => SchemeRule::ArticleTable {
            article_commissions: parse_article_commissions(&reader, &scheme_id)?,
        },
        "booster" | "slab" | "slabbased" => SchemeRule::Booster {
            slab_type: parse_slab_type(reader.string(SLAB_TYPE).as_deref())?,
            slabs: parse_slabs(&reader, &scheme_id)?,
        },
        _ => {
            return Err(ImportError::UnknownVariant {
                field: "schemeType".to_string(),
                value: type_token,
            })
        }
    };

    Ok(Scheme {
        distributors: parse_distributor_selection(&reader, &scheme_id)?,
        articles: parse_article_selection(&reader),
        scheme_id,
        scheme_name,
        commission_type,
        rule,
    })
}

pub fn parse_commission_type(raw: &str) -> ImportResult<CommissionType> {
    match normalize_token(raw).as_str() {
        "fixed" | "flat" => Ok(CommissionType::Fixed),
        "absoluteperunit" | "absolute" | "perunit" => Ok(CommissionType::AbsolutePerUnit),
        "percentage" | "percent" => Ok(CommissionType::Percentage),
        other => Err(ImportError::UnknownVariant {
            field: "commissionType".to_string(),
            value: other.to_string(),
        }),
    }
}

/// 阶梯口径,缺省按数量
fn parse_slab_type(raw: Option<&str>) -> ImportResult<SlabType> {
    match raw.map(normalize_token).as_deref() {
        None | Some("quantity") | Some("qty") => Ok(SlabType::Quantity),
        Some("value") | Some("amount") | Some("netsales") => Ok(SlabType::Value),
        Some(other) => Err(ImportError::UnknownVariant {
            field: "slabType".to_string(),
            value: other.to_string(),
        }),
    }
}

fn parse_slabs(reader: &FieldReader<'_>, scheme_id: &str) -> ImportResult<Vec<Slab>> {
    let Some(Value::Array(items)) = reader.value(SLABS) else {
        return Err(invalid(scheme_id, "阶梯方案缺少 slabs 列表"));
    };

    let mut slabs = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let slab_reader = FieldReader::new(item, format!("slab {}", index))?;
        let slab = Slab {
            min: slab_reader.f64(SLAB_MIN)?.unwrap_or(0.0),
            max: slab_reader.f64(SLAB_MAX)?,
            rate: slab_reader.required_f64(SLAB_RATE)?,
        };
        if let Some(max) = slab.max {
            if max < slab.min {
                return Err(invalid(
                    scheme_id,
                    &format!("阶梯 {} 上限 {} 小于下限 {}", index, max, slab.min),
                ));
            }
        }
        slabs.push(slab);
    }

    if slabs.is_empty() {
        return Err(invalid(scheme_id, "阶梯方案 slabs 为空"));
    }

    // 稳定排序: min 相同的阶梯保持原始顺序
    slabs.sort_by(|a, b| a.min.total_cmp(&b.min));
    Ok(slabs)
}

/// 物料费率表: 接受 {articleId: rate} 或 [{articleId, commission}]
fn parse_article_commissions(
    reader: &FieldReader<'_>,
    scheme_id: &str,
) -> ImportResult<HashMap<String, f64>> {
    let mut table = HashMap::new();

    match reader.value(ARTICLE_COMMISSIONS) {
        Some(Value::Object(map)) => {
            for (article_id, rate) in map {
                let entry = serde_json::json!({ "articleId": article_id, "commission": rate });
                let entry_reader = FieldReader::new(&entry, format!("article {}", article_id))?;
                table.insert(article_id.trim().to_string(), entry_reader.required_f64(ENTRY_RATE)?);
            }
        }
        Some(Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                let entry_reader = FieldReader::new(item, format!("article entry {}", index))?;
                table.insert(
                    entry_reader.required_string(ENTRY_ARTICLE)?,
                    entry_reader.required_f64(ENTRY_RATE)?,
                );
            }
        }
        _ => return Err(invalid(scheme_id, "物料费率方案缺少 articleCommissions")),
    }

    Ok(table)
}

fn parse_distributor_selection(
    reader: &FieldReader<'_>,
    scheme_id: &str,
) -> ImportResult<DistributorSelection> {
    let ids: HashSet<String> = reader.string_list(DISTRIBUTOR_IDS).into_iter().collect();
    let mode = reader.string(DISTRIBUTOR_MODE).map(|m| normalize_token(&m));

    let explicit = match mode.as_deref() {
        Some("explicit") | Some("specific") | Some("selected") => true,
        Some("all") | Some("criteria") | Some("matchingcriteria") => false,
        Some(other) => {
            return Err(ImportError::UnknownVariant {
                field: "distributorSelection".to_string(),
                value: other.to_string(),
            })
        }
        // 未声明模式时,有 id 清单即视为清单模式
        None => !ids.is_empty(),
    };

    if explicit {
        if ids.is_empty() {
            return Err(invalid(scheme_id, "清单模式下 distributorIds 为空"));
        }
        return Ok(DistributorSelection::Explicit {
            distributor_ids: ids,
        });
    }

    Ok(DistributorSelection::MatchingCriteria(DistributorCriteria {
        zone: reader.string(ZONE),
        state: reader.string(STATE),
        distributor_type: reader.string(DISTRIBUTOR_TYPE),
    }))
}

fn parse_article_selection(reader: &FieldReader<'_>) -> ArticleSelection {
    let explicit: HashSet<String> = reader.string_list(ARTICLE_IDS).into_iter().collect();
    if !explicit.is_empty() {
        return ArticleSelection::Explicit {
            article_ids: explicit,
        };
    }

    let other: HashSet<String> = reader.string_list(OTHER_ARTICLE_IDS).into_iter().collect();
    if !other.is_empty() {
        return ArticleSelection::Other { article_ids: other };
    }

    let filter = ArticleHierarchyFilter {
        families: reader.string_list(FAMILIES).into_iter().collect(),
        classes: reader.string_list(CLASSES).into_iter().collect(),
        brands: reader.string_list(BRANDS).into_iter().collect(),
    };
    if filter.is_active() {
        ArticleSelection::Hierarchy(filter)
    } else {
        ArticleSelection::All
    }
}

fn invalid(scheme_id: &str, message: &str) -> ImportError {
    ImportError::InvalidScheme {
        scheme_id: scheme_id.to_string(),
        message: message.to_string(),
    }
}
