//! Run the plotting pipeline over a fake results directory, as `bbrunner plot` would.

use std::fs;
use std::path::Path;

use bbrunner::plot::{generate, PlotOptions, PlotStyle};

const RAW: &str = "Keys,Levels,BitsPerKey,CreateTime,FindTime\n\
                   100,3,3.1,1.0000,0.5000\n\
                   100,3,3.1,1.2000,0.7000\n\
                   1000,4,3.2,9.0000,4.0000\n";

fn results_tree(root: &Path) {
    let host = root.join("bbhashbench_2023-09-15_21-49-14").join("bbchain3");
    fs::create_dir_all(&host).unwrap();
    fs::write(host.join("bbhash-par2-gamma-2.0-partitions-4.csv"), RAW).unwrap();
    fs::write(host.join("params.json"), "{}").unwrap();
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect()
}

#[test]
fn summaries_documents_and_index() {
    let tmp = tempfile::tempdir().unwrap();
    let runs = tmp.path().join("runs");
    let plots = tmp.path().join("plots");
    results_tree(&runs);

    let index = generate(&runs, &plots, &PlotOptions::default()).unwrap();
    assert_eq!(index, plots.join("main.tex"));

    let create = read_rows(&plots.join("create_bbhash-par2-gamma-2.0-partitions-4_bbchain3.csv"));
    assert_eq!(create.len(), 2);
    assert_eq!(create[0][0], "100");
    let mean: f64 = create[0][1].parse().unwrap();
    let std: f64 = create[0][2].parse().unwrap();
    assert!((mean - 1.1).abs() < 1e-9);
    assert!((std - 0.1414213562).abs() < 1e-6);

    // One sample: no standard deviation.
    assert_eq!(create[1][0], "1000");
    assert_eq!(create[1][2], "");

    let find = read_rows(&plots.join("find_bbhash-par2-gamma-2.0-partitions-4_bbchain3.csv"));
    let mean: f64 = find[0][1].parse().unwrap();
    assert!((mean - 0.6).abs() < 1e-9);

    let doc =
        fs::read_to_string(plots.join("bbhash-par2-gamma-2.0-partitions-4_bbchain3_pgfplots.tex"))
            .unwrap();
    assert!(doc.contains("Create Parallel2, Gamma 2.0, Partitions 4"));
    assert!(doc.contains("Find Parallel2, Gamma 2.0, Partitions 4"));
    assert!(doc.contains("create_bbhash-par2-gamma-2.0-partitions-4_bbchain3.csv"));

    let main = fs::read_to_string(&index).unwrap();
    assert!(main.contains("\\input{bbhash-par2-gamma-2.0-partitions-4_bbchain3_pgfplots.tex}"));
    assert!(!main.contains("\\input{main.tex}"));
}

#[test]
fn rerunning_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let runs = tmp.path().join("runs");
    let plots = tmp.path().join("plots");
    results_tree(&runs);

    let opts = PlotOptions {
        ext: "csv".into(),
        style: PlotStyle::Bar,
    };

    generate(&runs, &plots, &opts).unwrap();
    let mut first = vec![];
    for entry in fs::read_dir(&plots).unwrap() {
        let path = entry.unwrap().path();
        first.push((path.clone(), fs::read(&path).unwrap()));
    }
    first.sort();

    generate(&runs, &plots, &opts).unwrap();
    let mut second = vec![];
    for entry in fs::read_dir(&plots).unwrap() {
        let path = entry.unwrap().path();
        second.push((path.clone(), fs::read(&path).unwrap()));
    }
    second.sort();

    assert_eq!(first, second);
}

#[test]
fn plot_dir_inside_the_results_is_not_reprocessed() {
    let tmp = tempfile::tempdir().unwrap();
    results_tree(tmp.path());
    let plots = tmp.path().join("plot");

    generate(tmp.path(), &plots, &PlotOptions::default()).unwrap();
    generate(tmp.path(), &plots, &PlotOptions::default()).unwrap();

    let tex = fs::read_dir(&plots)
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .file_name()
                .to_str()
                .unwrap()
                .ends_with("_pgfplots.tex")
        })
        .count();
    assert_eq!(tex, 1);
}

#[test]
fn badly_named_results_abort_the_run() {
    let tmp = tempfile::tempdir().unwrap();
    let runs = tmp.path().join("runs");
    fs::create_dir_all(runs.join("bbchain2")).unwrap();
    fs::write(runs.join("bbchain2").join("results.csv"), RAW).unwrap();

    assert!(generate(&runs, &tmp.path().join("plots"), &PlotOptions::default()).is_err());
}
