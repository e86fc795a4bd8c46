// ==========================================
// 分销商佣金计算系统 - 字段映射器
// ==========================================
// 职责: 多别名字段读取 + 类型转换(数字/字符串/列表/日期)
// 说明: 别名解析只在导入层出现,计算层只接触严格类型
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use chrono::NaiveDate;
use serde_json::{Map, Value};

// ==========================================
// FieldReader - 单条 JSON 记录的字段读取器
// ==========================================
pub struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    context: String,
}

impl<'a> FieldReader<'a> {
    /// 创建读取器
    ///
    /// # 参数
    /// - value: 原始记录
    /// - context: 错误上下文(如 "row 12" / "scheme")
    pub fn new(value: &'a Value, context: impl Into<String>) -> ImportResult<Self> {
        let context = context.into();
        match value.as_object() {
            Some(object) => Ok(Self { object, context }),
            None => Err(ImportError::NotAnObject { context }),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// 按别名顺序取第一个非 null 值
    pub fn value(&self, aliases: &[&str]) -> Option<&'a Value> {
        aliases
            .iter()
            .filter_map(|alias| self.object.get(*alias))
            .find(|v| !v.is_null())
    }

    /// 字符串字段(数字也接受),空白视为缺失
    pub fn string(&self, aliases: &[&str]) -> Option<String> {
        let raw = match self.value(aliases)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        if raw.is_empty() {
            None
        } else {
            Some(raw)
        }
    }

    pub fn required_string(&self, aliases: &[&str]) -> ImportResult<String> {
        self.string(aliases).ok_or_else(|| self.missing(aliases))
    }

    /// 浮点字段(接受数字或数字字符串)
    pub fn f64(&self, aliases: &[&str]) -> ImportResult<Option<f64>> {
        let Some(value) = self.value(aliases) else {
            return Ok(None);
        };

        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) if s.trim().is_empty() => return Ok(None),
            Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
            _ => None,
        };

        match parsed {
            Some(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(ImportError::TypeConversionError {
                context: self.context.clone(),
                field: aliases[0].to_string(),
                message: format!("无法解析为数值: {}", value),
            }),
        }
    }

    pub fn required_f64(&self, aliases: &[&str]) -> ImportResult<f64> {
        self.f64(aliases)?.ok_or_else(|| self.missing(aliases))
    }

    /// 字符串列表: 接受数组或逗号分隔字符串
    pub fn string_list(&self, aliases: &[&str]) -> Vec<String> {
        match self.value(aliases) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// 日期字段(YYYY-MM-DD 或 YYYYMMDD)
    pub fn date(&self, aliases: &[&str]) -> ImportResult<Option<NaiveDate>> {
        let Some(raw) = self.string(aliases) else {
            return Ok(None);
        };
        let raw = raw.get(..10).unwrap_or(&raw);

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
            .map(Some)
            .map_err(|_| ImportError::TypeConversionError {
                context: self.context.clone(),
                field: aliases[0].to_string(),
                message: format!("日期格式错误: {}", raw),
            })
    }

    fn missing(&self, aliases: &[&str]) -> ImportError {
        ImportError::MissingField {
            context: self.context.clone(),
            field: aliases.join("|"),
        }
    }
}

/// 枚举取值归一: 小写 + 去掉分隔符
pub fn normalize_token(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .collect()
}
