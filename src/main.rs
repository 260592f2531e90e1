use std::env;
use std::fs;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use query_validator::{compile, Record, Validator, ValidatorConfig, Value};

const CONFIG_FILE: &str = "validator.json";

/// 加载校验器配置，失败时使用默认配置
fn load_config() -> ValidatorConfig {
    match ValidatorConfig::from_json_file(CONFIG_FILE) {
        Ok(config) => {
            println!("✅ 使用JSON配置文件: {}", CONFIG_FILE);
            println!("  remove_prefix = {}", config.remove_prefix);
            println!("  snake_case_names = {}", config.snake_case_names);
            config
        }
        Err(e) => {
            println!("⚠️ 无法加载配置文件 ({}), 使用默认配置", e);
            ValidatorConfig::default()
        }
    }
}

/// 内置的示例记录
fn sample_record() -> Value {
    Value::Record(
        Record::new("Member")
            .field("id", 1)
            .field("member_id", 45)
            .field("name", "Budi")
            .field("division", "engineering")
            .field("score", 87.5)
            .field("active", true)
            .field("joined_at", Utc.with_ymd_and_hms(2020, 3, 9, 0, 0, 0).single())
            .field(
                "address",
                Record::new("Address").field("city", "mojokerto").field("province", "jatim"),
            ),
    )
}

/// 从JSON文件加载记录，未指定文件时使用示例记录
fn load_record(path: Option<&str>) -> Result<Value> {
    let Some(path) = path else {
        return Ok(sample_record());
    };
    let content =
        fs::read_to_string(path).with_context(|| format!("无法读取记录文件 {}", path))?;
    let json: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("无法解析JSON记录文件 {}", path))?;
    Ok(Value::from(json))
}

/// `:cmp <参考规则> ;; <输入规则>`
fn run_comparison(args: &str) {
    let Some((reference, input)) = args.split_once(";;") else {
        println!("用法: :cmp <参考规则> ;; <输入规则>");
        return;
    };

    let validator = Validator::new(reference.trim());
    let result = validator.validate_condition(&compile(input.trim()));
    println!("[比较结果]: {}", result);
}

fn run_query(query: &str, record: &Value, config: ValidatorConfig) -> Result<()> {
    let condition = compile(query);
    if !condition.has_attributes() {
        println!("⚠️ 查询中没有可识别的属性，结果总是 false");
    }

    println!("[条件树]:\n{}", serde_json::to_string_pretty(&condition)?);
    println!("[规范形式]: {}", condition);

    let validator = Validator::from_condition(condition).with_config(config);
    match validator.validate(record) {
        Ok(result) => println!("[校验结果]: {}", result),
        Err(e) => println!("✗ 校验失败: {}", e),
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    println!("--- Query Validator: 条件查询校验 ---");

    println!("\n[配置信息]:");
    let config = load_config();

    let path = env::args().nth(1);
    let record = load_record(path.as_deref())?;
    println!("\n[记录]: {}", path.as_deref().unwrap_or("内置示例"));
    if let Some(fields) = record.as_record() {
        for field in &fields.fields {
            println!("  {} = {}", field.key(), field.value);
        }
    }

    println!("\n输入查询，例如 id=1 && (division=engineering || division=finance)");
    println!("输入 :cmp <参考规则> ;; <输入规则> 比较两条规则，Ctrl-C / Ctrl-D 退出\n");

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline(">> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line)?;

                match line.strip_prefix(":cmp") {
                    Some(args) => run_comparison(args),
                    None => run_query(line, &record, config)?,
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
