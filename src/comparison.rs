//! 规则比较引擎
//!
//! 不需要具体记录，判断一条输入规则是否与参考规则一致：
//! 参考规则的每个叶子都在输入规则树上求值，字面量对字面量比较。
//!
//! 求值前，参考规则提到而输入规则没有提到的每个属性，都以
//! `AND name = ""` 的形式追加到输入规则副本的根分组上。
//! 在输入树中，属性名不同的叶子被跳过（既不是 true 也不是 false），
//! 分组的结果只由同名叶子决定；全部被跳过的分组本身也被跳过。
//!
//! 比较规则：
//! - `=` 忽略大小写的文本相等，与推断类型无关
//! - 其他运算符按参考字面量的推断类型比较：日期按时间点，
//!   其余按尽力解析的浮点数（无法解析时为 0）

use log::{debug, trace};

use crate::ast::{Attribute, Condition, Connector, OperatorKind, ValueType};
use crate::evaluator::{date_matches, float_matches};
use crate::utils::{parse_datetime, str_to_f64};

pub struct ConditionComparator<'a> {
    reference: &'a Condition,
}

impl<'a> ConditionComparator<'a> {
    pub fn new(reference: &'a Condition) -> Self {
        Self { reference }
    }

    /// 用参考规则对 `input` 求值，`input` 本身不会被修改
    pub fn matches(&self, input: &Condition) -> bool {
        let augmented = augment_input(self.reference, input);
        self.evaluate_reference(self.reference, &augmented)
    }

    fn evaluate_reference(&self, node: &Condition, input: &Condition) -> bool {
        match node {
            Condition::Leaf(attr) => {
                if attr.is_empty() {
                    return false;
                }
                match_input(attr, input).unwrap_or(false)
            }
            Condition::Group(group) => {
                let mut result = self.evaluate_reference(group.head(), input);
                for clause in group.clauses() {
                    let next = self.evaluate_reference(&clause.condition, input);
                    result = clause.connector.fold(result, next);
                }
                result
            }
        }
    }
}

/// 复制 `input`，为输入中从未出现的每个参考属性在根上追加 `name = ""` 叶子
pub fn augment_input(reference: &Condition, input: &Condition) -> Condition {
    let present = input.attribute_names();
    let mut augmented = input.clone();

    for name in reference.attribute_names() {
        if !present.contains(&name) {
            debug!("injecting default attribute {} = \"\"", name);
            augmented.push_clause(
                Connector::And,
                Condition::leaf(Attribute::new(name, OperatorKind::Eq, "")),
            );
        }
    }
    augmented
}

/// 在输入树上对一个参考叶子求值
/// 返回 `None` 表示遇到的输入叶子全部是其他属性
fn match_input(reference: &Attribute, input: &Condition) -> Option<bool> {
    match input {
        Condition::Leaf(attr) => {
            if attr.name != reference.name {
                return None;
            }
            let result = compare_literals(reference, &attr.value);
            trace!("{} against input {}: {}", reference, attr, result);
            Some(result)
        }
        Condition::Group(group) => {
            let mut result: Option<bool> = None;
            for (connector, child) in group.children() {
                let Some(next) = match_input(reference, child) else {
                    continue;
                };
                result = Some(match result {
                    // 第一个未被跳过的子节点作为初始值
                    None => next,
                    Some(acc) => connector.unwrap_or(Connector::And).fold(acc, next),
                });
            }
            result
        }
    }
}

/// 用参考运算符检查 `input_value <op> reference.value`
///
/// 只有 `=` 忽略大小写。`!=`、`|=`、`|~` 与大小比较一样走推断类型：
/// 日期按时间点比较（任一侧无法解析为 false），其余按浮点数比较。
/// 在浮点数路径上 `|=` 和 `|~` 总是 false。
pub fn compare_literals(reference: &Attribute, input_value: &str) -> bool {
    let literal = reference.value.as_str();
    let op = reference.operator;

    if op == OperatorKind::Eq {
        return input_value.to_lowercase() == literal.to_lowercase();
    }

    match reference.value_type {
        ValueType::Date => match (parse_datetime(input_value), parse_datetime(literal)) {
            (Some(input), Some(reference)) => date_matches(op, &input, &reference),
            _ => false,
        },
        ValueType::Numeric | ValueType::Text => {
            float_matches(op, str_to_f64(input_value), str_to_f64(literal))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::Parser;

    fn compile(query: &str) -> Condition {
        let tokens = tokenize(query);
        Parser::new(&tokens).parse()
    }

    fn compare(reference: &str, input: &str) -> bool {
        let reference = compile(reference);
        ConditionComparator::new(&reference).matches(&compile(input))
    }

    #[test]
    fn test_rule_comparison_cases() {
        let cases = [
            ("id=1 && member_id=45", "id=2 || member_id=45", false),
            (
                "name=Budi && brand=Arava && member_id=45",
                "name=budi && brand=arava && member_id=45",
                true,
            ),
            ("id=1 && member_id=45", "(id=2||id=1) && member_id=45", true),
            ("id=1 && member_id=45", "id=1", false),
            ("id=1 || member_id=45", "id=1", true),
            ("id=1 || member_id=45", "member_id=45", true),
            ("id=1 && member_id=45", "id=1 && member_id=45", true),
            ("id=1 && member_id=45", "id=1 && (member_id=23||member_id=35)", false),
            ("id=1 && member_id=45", "id=1 && (member_id=23||member_id=45)", true),
            ("id=1 && member_id=45", "id=1 && member_id=44", false),
            ("id=1 || member_id=45", "id=1 && member_id=22", true),
            ("(id=1 || id=2) && member_id=45", "id=1 && member_id=45", true),
            (
                "id=1 &&  member_id=3  && ((division=engineering || division=finance || division=people)&&(member_id=2||id=1))",
                "id=1 && member_id=3 && division=engineering",
                true,
            ),
            (
                "id=1 &&  member_id=3  && ((division=engineering || division=finance || division=people)&&(member_id=2||id=1))",
                "(id=1 && member_id=3) && (division=tech&&division=finance)",
                false,
            ),
            (
                "id=1 &&  member_id=3  && ((division=engineering || division=finance || division=people)&&(member_id=2||id=1))",
                "((id=1 && member_id=3) && (division=tech||division=finance))",
                true,
            ),
            ("(id=1 || id=2) && (member_id=45||member_id=10)", "id=1 && (member_id=10)", true),
            ("(id=1 || id=2) && (member_id=45||member_id=10)", "id=3 && member_id=10 || id=14", false),
            (
                "(id=1 || id=2) && (member_id=45||member_id=10) && (segment=trial||segment=free)",
                "id=1 && member_id=10 && segment=free",
                true,
            ),
            ("id=1", "id=1 && member_id=10 && segment=free", true),
            ("deviceType=mobile || memberId=xxx", "deviceType=mobile", true),
            ("deviceType=mobile && memberId=xxx", "deviceType=mobile", false),
            ("deviceType=mobile && ABTest=xxx ", "deviceType=mobile && ABTest=yyy", false),
            (
                "deviceType=mobile && ABTest=xxx ",
                "deviceType=mobile && (ABTest=yyy||ABTest=xxx)",
                true,
            ),
            ("(id=1 || id=2) && member_id>100", "id=1 && member_id=111", true),
            (
                "(id=1 || id=2) && price>1200.50 && (segment=hijaber||segment=girl||segment=cantik) && poin>100",
                "id=1 && price=1200.51 && ((segment=cantik&&poin=58)||(segment=girl&&poin=518))",
                true,
            ),
        ];

        for (reference, input, expected) in cases {
            assert_eq!(
                compare(reference, input),
                expected,
                "reference: {} / input: {}",
                reference,
                input
            );
        }
    }

    #[test]
    fn test_only_equality_ignores_case() {
        assert!(compare("name=Budi", "name=budi"));
        assert!(compare("code=007", r#"code="007""#));

        // 文本字面量上的 != 走浮点数路径：两侧都是 0
        assert!(!compare("name!=Budi", "name=Andi"));
        assert!(!compare("name!=Budi", "name=BUDI"));
        assert!(compare("id!=1", "id=2"));
        assert!(!compare("id!=1", "id=1.0"));
        assert!(compare("joined!=2020-01-01T00:00:00Z", "joined=2020-01-02T00:00:00Z"));
    }

    #[test]
    fn test_date_ordering() {
        assert!(compare(
            "joined>=2020-01-01T00:00:00Z",
            "joined=2020-03-09T00:00:00+07:00"
        ));
        assert!(!compare(
            "joined>2020-01-01T00:00:00Z",
            "joined=2019-12-31T23:59:59Z"
        ));
        // 不是日期的输入字面量永远不满足日期比较
        assert!(!compare("joined>2020-01-01T00:00:00Z", "joined=tomorrow"));
    }

    #[test]
    fn test_ordering_falls_back_to_floats() {
        assert!(compare("score<10", "score=9.5"));
        assert!(!compare("score<10", "score=10"));
        // 非数字输入按 0 处理
        assert!(compare("score<10", "score=abc"));
    }

    #[test]
    fn test_contains_and_regex_follow_inferred_type() {
        assert!(!compare("title|=plan", r#"title="Release PLAN""#));
        assert!(!compare("title|=plan", "title=plan"));
        assert!(!compare(r#"title|~"^rel""#, "title=release"));
        assert!(!compare("score|=10", "score=10"));
        // 无效的正则不会被编译，也不会报错
        assert!(!compare(r#"title|~"(""#, "title=x"));
    }

    #[test]
    fn test_skip_does_not_seed_group() {
        // 开头不相关的叶子被跳过，分组结果只来自 id=2
        assert!(!compare("id=1", "member_id=10 || id=2"));
        assert!(compare("id=1", "member_id=10 || id=1"));
    }

    #[test]
    fn test_empty_reference_is_false() {
        assert!(!compare("", "id=1"));
    }

    #[test]
    fn test_input_is_not_modified() {
        let reference = compile("id=1 && member_id=45");
        let input = compile("id=1");
        let before = input.clone();
        ConditionComparator::new(&reference).matches(&input);
        assert_eq!(input, before);
    }

    #[test]
    fn test_defaults_are_injected_at_root_for_flat_reference() {
        let reference = compile("id=1 && member_id=45");
        let augmented = augment_input(&reference, &compile("id=1"));

        let root = augmented.as_group().unwrap();
        assert_eq!(root.len(), 2);
        let injected = root.clauses()[0].condition.as_leaf().unwrap();
        assert_eq!(root.clauses()[0].connector, Connector::And);
        assert_eq!(injected.name, "member_id");
        assert_eq!(injected.operator, OperatorKind::Eq);
        assert_eq!(injected.value, "");
    }

    #[test]
    fn test_defaults_are_injected_at_root_for_nested_reference() {
        let reference = compile("id=1 && (member_id=45 || (segment=free && tier=gold))");
        let augmented = augment_input(&reference, &compile("(id=1 && member_id=45)"));

        // 嵌套的输入分组保持不变，默认叶子追加在它旁边
        let root = augmented.as_group().unwrap();
        assert_eq!(root.len(), 3);
        assert_eq!(root.head().leaf_count(), 2);
        let injected: Vec<_> = root
            .clauses()
            .iter()
            .map(|c| c.condition.as_leaf().unwrap().name.clone())
            .collect();
        assert_eq!(injected, vec!["segment".to_string(), "tier".to_string()]);

        assert!(compare(
            "id=1 && (member_id=45 || (segment=free && tier=gold))",
            "(id=1 && member_id=45)"
        ));
        assert!(!compare(
            "id=1 && (member_id=44 || (segment=free && tier=gold))",
            "(id=1 && member_id=45)"
        ));
    }
}
