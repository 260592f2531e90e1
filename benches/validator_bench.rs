use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use query_validator::comparison::ConditionComparator;
use query_validator::flatten::flatten;
use query_validator::lexer::Lexer;
use query_validator::parser::Parser;
use query_validator::{compile, Record, Validator, ValidatorConfig, Value};
use std::hint::black_box;

const QUERIES: [(&str, &str); 3] = [
    ("simple", "id=1"),
    ("medium", "id=1 && member_id>=45 && (division=engineering || division=finance)"),
    (
        "complex",
        r#"(id=1 || id=2) && price>1200.50 && (segment=hijaber||segment=girl||segment=cantik) && name|~"^B[a-z]+" && joined_at<2021-01-01T00:00:00Z"#,
    ),
];

// 构造一条用于求值的记录
fn create_record(id: i64) -> Record {
    Record::new("Member")
        .field("id", id)
        .field("member_id", 45 + id)
        .field("division", if id % 2 == 0 { "engineering" } else { "finance" })
        .field("price", 1200.75)
        .field("segment", "girl")
        .field("name", "Budi")
        .field("joined_at", Value::Text("2020-03-09T00:00:00Z".to_string()))
}

// 基准测试：词法分析性能
fn benchmark_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_performance");

    for (name, query) in QUERIES {
        group.bench_with_input(BenchmarkId::new("tokenize", name), &query, |b, &query| {
            b.iter(|| {
                let tokens: Vec<_> = Lexer::new(black_box(query)).collect();
                black_box(tokens)
            })
        });
    }

    group.finish();
}

// 基准测试：条件树构建性能
fn benchmark_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_performance");

    for (name, query) in QUERIES {
        // 预先词法分析
        let tokens: Vec<_> = Lexer::new(query).collect();

        group.bench_with_input(BenchmarkId::new("parse", name), &tokens, |b, tokens| {
            b.iter(|| black_box(Parser::new(black_box(tokens)).parse()))
        });
    }

    group.finish();
}

// 基准测试：记录校验性能（展平后求值）
fn benchmark_validate(c: &mut Criterion) {
    let record = create_record(1);
    let mut group = c.benchmark_group("validate_performance");

    for (name, query) in QUERIES {
        let validator = Validator::new(query);
        group.bench_with_input(BenchmarkId::new("validate", name), &record, |b, record| {
            b.iter(|| black_box(validator.validate(black_box(record))))
        });

        let flat = flatten(&record, &ValidatorConfig::default());
        group.bench_with_input(BenchmarkId::new("validate_flat", name), &flat, |b, flat| {
            b.iter(|| black_box(validator.validate_flat(black_box(flat))))
        });
    }

    group.finish();
}

// 基准测试：规则比较性能
fn benchmark_compare(c: &mut Criterion) {
    let cases = [
        ("flat", "id=1 && member_id=45", "(id=2||id=1) && member_id=45"),
        (
            "nested",
            "(id=1 || id=2) && price>1200.50 && (segment=hijaber||segment=girl||segment=cantik) && poin>100",
            "id=1 && price=1200.51 && ((segment=cantik&&poin=58)||(segment=girl&&poin=518))",
        ),
    ];

    let mut group = c.benchmark_group("compare_performance");

    for (name, reference, input) in cases {
        let reference = compile(reference);
        let input = compile(input);
        group.bench_with_input(BenchmarkId::new("matches", name), &input, |b, input| {
            let comparator = ConditionComparator::new(&reference);
            b.iter(|| black_box(comparator.matches(black_box(input))))
        });
    }

    group.finish();
}

// 基准测试：序列过滤性能
fn benchmark_filter(c: &mut Criterion) {
    let validator = Validator::new("id>10 && division=engineering");
    let mut group = c.benchmark_group("filter_performance");

    for size in [100, 1000] {
        let records: Vec<Record> = (0..size).map(create_record).collect();
        group.bench_with_input(BenchmarkId::new("filter_slice", size), &records, |b, records| {
            b.iter(|| black_box(validator.filter_slice(black_box(records))))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_lexer,
    benchmark_parser,
    benchmark_validate,
    benchmark_compare,
    benchmark_filter
);
criterion_main!(benches);
