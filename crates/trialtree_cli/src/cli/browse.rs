//! Read-only commands: ls, subject, trial, segment, classify

use super::context::Context;
use super::output::{
    display_path, format_metric, plain, print_json, print_table, print_table_colored,
    status_cell, type_cell, yes_no,
};
use anyhow::Result;
use serde::Serialize;
use trialtree::contents::{DatasetEntry, SubjectContents, TrialContents, TrialSegmentContents};
use trialtree::paths;
use trialtree::reserved::RESULTS_FILE;
use trialtree::results::SegmentResults;
use trialtree::{ObjectStore, PathCache, PathStatus, PathType, TrialTreeError};

/// Node header shared by the JSON output of every read command
#[derive(Debug, Serialize)]
struct Node<T: Serialize> {
    #[serde(rename = "type")]
    path_type: PathType,
    status: PathStatus,
    #[serde(flatten)]
    contents: T,
}

fn print_header(path: &str, path_type: PathType, status: PathStatus) {
    println!("{}  [{} | {}]", display_path(path), path_type, status);
}

/// Entries whose type may still change as more listings arrive.
fn unclassified(entries: &[DatasetEntry]) -> usize {
    entries.iter().filter(|e| e.path_type.is_provisional()).count()
}

/// `trialtree ls [PATH] [--status STATUS]`
pub async fn ls(ctx: &Context, path: &str, only: Option<PathStatus>) -> Result<()> {
    let session = &ctx.session;
    session.settle(path).await?;
    let mut contents = session.recompute(|s| s.dataset_contents(path)).await;
    let path_type = session.classify(path);
    let status = session.status(path);
    if let Some(wanted) = only {
        contents.entries.retain(|e| e.status == wanted);
    }

    if ctx.json {
        return print_json(&Node {
            path_type,
            status,
            contents,
        });
    }

    print_header(&contents.path, path_type, status);
    if contents.entries.is_empty() {
        println!("(no folders)");
        return Ok(());
    }
    let rows = contents
        .entries
        .iter()
        .map(|entry| {
            vec![
                plain(&entry.name),
                type_cell(entry.path_type),
                status_cell(entry.status),
            ]
        })
        .collect();
    print_table_colored(&["NAME", "TYPE", "STATUS"], rows);
    match unclassified(&contents.entries) {
        0 => {}
        n => println!("{} folder(s) without a recognised type", n),
    }
    Ok(())
}

/// `trialtree subject PATH`
pub async fn subject(ctx: &Context, path: &str) -> Result<()> {
    let session = &ctx.session;
    session.settle(path).await?;
    let contents: SubjectContents = session.recompute(|s| s.subject_contents(path)).await;
    let path_type = session.classify(path);
    let status = session.status(path);

    if ctx.json {
        return print_json(&Node {
            path_type,
            status,
            contents,
        });
    }

    print_header(&contents.path, path_type, status);
    println!("results: {}", yes_no(contents.has_results));
    if contents.trials.is_empty() {
        println!("(no trials)");
        return Ok(());
    }
    let rows = contents
        .trials
        .iter()
        .map(|trial| {
            vec![
                trial.name.clone(),
                yes_no(trial.has_markers_c3d).to_string(),
                yes_no(trial.has_markers_trc).to_string(),
                yes_no(trial.has_grf_mot).to_string(),
                trial.segments.len().to_string(),
            ]
        })
        .collect();
    print_table(&["TRIAL", "C3D", "TRC", "GRF", "SEGMENTS"], rows);
    Ok(())
}

/// `trialtree trial PATH`
pub async fn trial(ctx: &Context, path: &str) -> Result<()> {
    let session = &ctx.session;
    session.settle(path).await?;
    let contents: TrialContents = session.recompute(|s| s.trial_contents(path)).await;
    let path_type = session.classify(path);
    let status = session.status(path);

    if ctx.json {
        return print_json(&Node {
            path_type,
            status,
            contents,
        });
    }

    print_header(&contents.path, path_type, status);
    println!(
        "markers.c3d: {}  markers.trc: {}  grf.mot: {}",
        yes_no(contents.has_markers_c3d),
        yes_no(contents.has_markers_trc),
        yes_no(contents.has_grf_mot)
    );
    if contents.segments.is_empty() {
        println!("(no segments)");
        return Ok(());
    }
    let rows = contents
        .segments
        .iter()
        .map(|segment| {
            let has_results = session
                .cache()
                .cached_listing(&segment.path)
                .is_some_and(|l| l.has_immediate_file(RESULTS_FILE));
            vec![
                segment.name.clone(),
                yes_no(has_results).to_string(),
                segment.results_json.clone(),
            ]
        })
        .collect();
    print_table(&["SEGMENT", "RESULTS", "RESULTS KEY"], rows);
    Ok(())
}

#[derive(Debug, Serialize)]
struct SegmentReport {
    #[serde(flatten)]
    contents: TrialSegmentContents,
    results: Option<SegmentResults>,
}

/// `trialtree segment PATH`
pub async fn segment(ctx: &Context, path: &str) -> Result<()> {
    let session = &ctx.session;
    let contents = session.trial_segment_contents(path);
    let results = match session.store().download_text(&contents.results_json).await {
        Ok(text) => Some(SegmentResults::parse(&text)?),
        Err(TrialTreeError::NotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };

    if ctx.json {
        return print_json(&SegmentReport { contents, results });
    }

    println!("{}", contents.path);
    let Some(results) = results else {
        println!("no results yet ({})", contents.results_json);
        return Ok(());
    };

    let mut rows = vec![
        vec!["trial".to_string(), results.trial_name.clone()],
        vec![
            "frames".to_string(),
            format!("{}..{} ({})", results.start_frame, results.end_frame, results.frame_count()),
        ],
        vec!["duration (s)".to_string(), format!("{:.3}", results.duration_secs())],
        vec![
            "kinematics".to_string(),
            format!("{:?}", results.kinematics_status),
        ],
        vec![
            "kinematics RMSE".to_string(),
            format_metric(results.kinematics_avg_rmse),
        ],
        vec!["dynamics".to_string(), format!("{:?}", results.dynamics_status)],
        vec![
            "dynamics RMSE".to_string(),
            format_metric(results.dynamics_avg_rmse),
        ],
        vec![
            "GRF coverage".to_string(),
            results
                .grf_coverage()
                .map(|c| format!("{:.1}%", c * 100.0))
                .unwrap_or_else(|| "-".to_string()),
        ],
    ];
    if let Some((marker, rmse)) = results.worst_marker() {
        rows.push(vec!["worst marker".to_string(), format!("{} ({:.4})", marker, rmse)]);
    }
    if results.has_error {
        rows.push(vec![
            "error".to_string(),
            results.error_msg.clone().unwrap_or_default(),
        ]);
    }
    print_table(&["FIELD", "VALUE"], rows);
    Ok(())
}

#[derive(Debug, Serialize)]
struct Classified {
    path: String,
    #[serde(rename = "type")]
    path_type: PathType,
    status: PathStatus,
}

/// `trialtree classify PATH...`
pub async fn classify(ctx: &Context, targets: &[String]) -> Result<()> {
    let session = &ctx.session;
    let mut report = Vec::with_capacity(targets.len());
    for target in targets {
        session.settle(target).await?;
        report.push(Classified {
            path: paths::normalize(target).to_string(),
            path_type: session.classify(target),
            status: session.status(target),
        });
    }

    if ctx.json {
        return print_json(&report);
    }
    let rows = report
        .iter()
        .map(|c| {
            vec![
                plain(display_path(&c.path)),
                type_cell(c.path_type),
                status_cell(c.status),
            ]
        })
        .collect();
    print_table_colored(&["PATH", "TYPE", "STATUS"], rows);
    Ok(())
}
