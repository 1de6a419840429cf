use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use lexr::{re, Action, LexEntry, Lexicon, Scanner};

fn tokenizer_lexicon() -> Arc<Lexicon<String>> {
    Arc::new(
        Lexicon::new([
            LexEntry::rule(re("if|then|else|end|while|do").unwrap(), Action::Text),
            LexEntry::rule(
                re("[a-zA-Z_][a-zA-Z0-9_]*").unwrap(),
                Action::Token("ident".to_string()),
            ),
            LexEntry::rule(
                re("0|[1-9][0-9]*").unwrap(),
                Action::Token("int".to_string()),
            ),
            LexEntry::rule(re(r"[-+*/=<>();,]").unwrap(), Action::Text),
            LexEntry::rule(re("#[^\n]*").unwrap(), Action::Ignore),
            LexEntry::rule(re("[ \t\n]+").unwrap(), Action::Ignore),
        ])
        .unwrap(),
    )
}

fn synthetic_source(lines: usize) -> String {
    let mut source = String::new();
    for i in 0..lines {
        source.push_str(&format!(
            "while x{i} < {bound} do # loop {i}\n  x{i} = x{i} + {step};\nend\n",
            i = i,
            bound = i * 17 + 3,
            step = i % 7 + 1,
        ));
    }
    source
}

fn scan_benchmark(c: &mut Criterion) {
    let lexicon = tokenizer_lexicon();
    let input = synthetic_source(500);

    c.bench_function("scan_benchmark", |b| {
        b.iter(|| {
            let mut scanner: Scanner<String> = Scanner::on_str(Arc::clone(&lexicon), input.clone());
            let mut count = 0usize;
            while !scanner.read().unwrap().is_eof() {
                count += 1;
            }
            count
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(50);
    targets = scan_benchmark
}

criterion_main!(benches);
