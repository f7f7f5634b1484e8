//! clipsift binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};

use clipsift_media::{download_video, FfmpegRunner};
use clipsift_ml_client::{SimilarityClient, SimilarityClientConfig};
use clipsift_models::{extract_youtube_id, ScoringProfile, Stage, StageFailure, Transcript};
use clipsift_worker::cli::Cli;
use clipsift_worker::highlights::TopicFilter;
use clipsift_worker::logging::init_tracing;
use clipsift_worker::{
    metrics, AnalyzerLimits, ClipJudge, ClipPipeline, ClipRenderer, GeminiJudge,
    JsonTranscriptProvider, QualityAnalyzer, TranscriptProvider, WorkerConfig, WorkerResult,
    YtDlpTranscriptProvider,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    if let Ok(addr) = std::env::var("METRICS_ADDR") {
        let addr: SocketAddr = addr
            .parse()
            .with_context(|| format!("invalid METRICS_ADDR '{}'", addr))?;
        metrics::install_exporter(addr)?;
    }

    let mut config = WorkerConfig::from_env();
    if let Some(dir) = &cli.output_dir {
        config = config.with_output_dir(dir.clone());
    }
    info!("Worker config: {:?}", config);

    let profile = Arc::new(match &config.scoring_profile_path {
        Some(path) => ScoringProfile::from_json_file(path)
            .with_context(|| format!("failed to load scoring profile {}", path.display()))?,
        None => ScoringProfile::default(),
    });

    let judge: Option<Arc<dyn ClipJudge>> = if cli.no_judge {
        None
    } else {
        match GeminiJudge::new(config.gemini_models.clone(), config.judge_timeout) {
            Ok(judge) => Some(Arc::new(judge)),
            Err(e) => {
                warn!("Gemini judge unavailable, scoring heuristically: {}", e);
                None
            }
        }
    };

    let analyzer = QualityAnalyzer::new(judge, Arc::clone(&profile)).with_limits(AnalyzerLimits {
        concurrency: config.judge_concurrency,
        call_timeout: config.judge_timeout,
        max_judged: config.max_judged_candidates,
    });

    let mut pipeline =
        ClipPipeline::new(Arc::clone(&profile), analyzer).with_run_timeout(config.run_timeout);
    if let Some(similarity) = SimilarityClientConfig::from_env() {
        let client = SimilarityClient::new(similarity)?;
        pipeline = pipeline.with_topic_filter(TopicFilter::new(Arc::new(client)));
    }

    let source_id = extract_youtube_id(&cli.source).unwrap_or_else(|| "source".to_string());
    let work_dir = config.work_dir.join(&source_id);

    let transcript = match fetch_transcript(&cli, &config, &work_dir).await {
        Ok(t) => t,
        Err(e) => {
            metrics::record_run("failed", 0.0);
            error!("Cannot run without a transcript: {}", e);
            return Err(e.into());
        }
    };

    let pipeline_config = cli.pipeline_config();
    let mut output = match pipeline
        .run(&transcript, &pipeline_config, &cli.analysis_context())
        .await
    {
        Ok(output) => output,
        Err(e) => {
            metrics::record_run("failed", 0.0);
            error!(fatal = e.is_run_fatal(), "Run aborted: {}", e);
            return Err(e.into());
        }
    };

    if !cli.dry_run && !output.selected.is_empty() {
        match source_video(&cli, &work_dir, &source_id).await {
            Ok(video) => {
                let (cancel_tx, cancel_rx) = watch::channel(false);
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("Received shutdown signal, cancelling renders");
                        let _ = cancel_tx.send(true);
                    }
                });

                let runner = FfmpegRunner::new()
                    .with_cancel(cancel_rx)
                    .with_timeout(config.render_timeout.as_secs());
                let renderer = ClipRenderer::new(&config.output_dir, config.render_concurrency)
                    .with_runner(runner)
                    .with_encoding(config.encoding.clone())
                    .with_burned_subtitles(cli.burn_subtitles);

                pipeline
                    .render(
                        &mut output,
                        &transcript,
                        &video,
                        &pipeline_config,
                        &renderer,
                        cli.framing(),
                    )
                    .await;
            }
            Err(e) => {
                error!("Source video unavailable, skipping render: {}", e);
                output.report.record_failure(
                    StageFailure::new(Stage::Render, e.to_string()).with_subject(&cli.source),
                );
            }
        }
    }

    let report_path = output.write_report(&config.output_dir).await?;

    for (i, clip) in output.selected.iter().enumerate() {
        info!(
            "#{} {} score={:.3} quality={:.1} ({})",
            i + 1,
            clip.candidate.label(),
            clip.candidate.score,
            clip.assessment.overall_score,
            clip.assessment.source
        );
    }
    info!(
        "Generated {}, deduplicated {}, selected {}, rendered {}, failures {}. Report: {}",
        output.report.generated,
        output.report.deduplicated,
        output.report.selected,
        output.report.rendered,
        output.report.failures.len(),
        report_path.display()
    );

    Ok(())
}

async fn fetch_transcript(
    cli: &Cli,
    config: &WorkerConfig,
    work_dir: &std::path::Path,
) -> WorkerResult<Transcript> {
    match &cli.transcript {
        Some(path) => JsonTranscriptProvider.fetch(&path.to_string_lossy()).await,
        None => {
            YtDlpTranscriptProvider::new(work_dir, config.caption_languages.clone())
                .fetch(&cli.source)
                .await
        }
    }
}

async fn source_video(
    cli: &Cli,
    work_dir: &std::path::Path,
    source_id: &str,
) -> WorkerResult<PathBuf> {
    if let Some(video) = &cli.video {
        return Ok(video.clone());
    }
    tokio::fs::create_dir_all(work_dir).await?;
    let path = work_dir.join(format!("{}.mp4", source_id));
    download_video(&cli.source, &path).await?;
    Ok(path)
}
