use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use trpcgen::config::GeneratorConfig;
use trpcgen::flatten::Flattener;
use trpcgen::generator::generate_app_router;
use trpcgen::scan::scan_project;
use trpcgen::source::{Project, Snippet};

/// A chain of `depth` schemas in separate files, each extending the previous one.
fn layered_project(depth: usize) -> Project {
    let mut sources = vec![(
        "schema0.ts".to_string(),
        "export const schema0 = z.object({ id: z.string() });".to_string(),
    )];
    for i in 1..depth {
        sources.push((
            format!("schema{i}.ts"),
            format!(
                "import {{ schema{prev} }} from './schema{prev}';\nconst field{i} = z.number().int();\nexport const schema{i} = schema{prev}.extend({{ f{i}: field{i} }});",
                prev = i - 1
            ),
        ));
    }
    let last = depth - 1;
    sources.push((
        "main.router.ts".to_string(),
        format!(
            "import {{ schema{last} }} from './schema{last}';\n@Router()\nexport class MainRouter {{\n  @Query({{ input: schema{last}, output: schema{last}.array() }})\n  list() {{}}\n}}\n"
        ),
    ));
    match Project::from_sources(sources) {
        Ok(project) => project,
        Err(err) => panic!("benchmark project failed to parse: {err:#}"),
    }
}

fn bench_flatten(c: &mut Criterion) {
    let project = layered_project(20);
    let Some(main) = project.unit("main.router.ts") else {
        panic!("main.router.ts missing");
    };
    let imports = project.import_map(main);
    let flattener = Flattener::new(&imports);
    let snippet = match Snippet::parse("schema19.optional()") {
        Ok(snippet) => snippet,
        Err(err) => panic!("{err:#}"),
    };

    c.bench_function("flatten_20_file_chain", |b| {
        b.iter(|| flattener.flatten_snippet(black_box(&snippet), main))
    });

    c.bench_function("import_map_20_files", |b| {
        b.iter(|| project.import_map(black_box(main)))
    });
}

fn bench_generate(c: &mut Criterion) {
    let project = layered_project(20);
    let scan = scan_project(&project);
    let config = GeneratorConfig::default();

    c.bench_function("generate_app_router", |b| {
        b.iter(|| generate_app_router(black_box(&project), &scan, &config))
    });
}

criterion_group!(benches, bench_flatten, bench_generate);
criterion_main!(benches);
