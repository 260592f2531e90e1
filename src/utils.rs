//! 编译器和两个求值引擎共用的类型转换与文本工具

use chrono::{DateTime, FixedOffset};
use convert_case::{Case, Casing};

use crate::flatten::FlatRecord;

/// 解析日期时间字面量
///
/// 唯一接受的格式是 RFC 3339（例如 `2006-01-02T15:04:05+07:00`
/// 或 `2006-01-02T15:04:05Z`），类型推断和求值都使用它
pub fn parse_datetime(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}

/// 尽力解析布尔值：`t` 和 `true` 为 true，其余都是 false
pub fn str_to_bool(value: &str) -> bool {
    matches!(value, "t" | "true")
}

/// 尽力解析浮点数：不是数字时返回 `0.0`
/// 逗号视为千位分隔符
pub fn str_to_f64(value: &str) -> f64 {
    parse_number(value).unwrap_or(0.0)
}

/// 严格解析浮点数，先去掉千位分隔符
pub fn parse_number(value: &str) -> Option<f64> {
    let cleaned: String = value.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse::<f64>().ok()
}

/// 严格解析整数，先去掉千位分隔符
pub fn parse_integer(value: &str) -> Option<i64> {
    let cleaned: String = value.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse::<i64>().ok()
}

/// 把名字转换为小写 snake case，幂等
pub fn to_snake_case(name: &str) -> String {
    name.to_case(Case::Snake)
}

/// 把属性路径中以 `.` 分隔的每一段转换为小写 snake case
pub fn normalize_name(name: &str) -> String {
    name.split('.')
        .map(to_snake_case)
        .collect::<Vec<_>>()
        .join(".")
}

/// 用展平记录中的值替换 `{{name}}` 占位符
///
/// 未知的占位符和没有闭合的 `{{` 保持原样
pub fn replace_placeholders(template: &str, attributes: &FlatRecord) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        output.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            output.push_str(&rest[open..]);
            return output;
        };

        let key = &after_open[..close];
        match attributes.get(key) {
            Some(value) => output.push_str(&value.to_string()),
            None => {
                output.push_str("{{");
                output.push_str(key);
                output.push_str("}}");
            }
        }
        rest = &after_open[close + 2..];
    }

    output.push_str(rest);
    output
}
