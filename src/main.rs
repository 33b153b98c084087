use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use csv::{Reader, Writer};
use serde::Serialize;
use walkdir::WalkDir;

use sync_geo_analyzer::{
    summarize_by_ssid, write_trip_gpx, AnalysisReport, Analyzer, AnalyzerConfig, EventRecord,
    EventStream,
};

const OUTPUT_DIR: &str = "analysis";

#[derive(Debug, Serialize)]
struct SightingRow {
    source_file: String,
    sighting_time: String,
    fix_time: String,
    time_delta_s: f64,
    bssid: String,
    ssid: String,
    signal: i32,
    latitude: f64,
    longitude: f64,
    distance_to_target_m: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ClusterRow {
    rank: usize,
    centroid_lat: f64,
    centroid_lon: f64,
    points: usize,
    share_percent: f64,
    first_visit: String,
    last_visit: String,
}

#[derive(Debug, Serialize)]
struct TripRow {
    gpx_file: String,
    start: String,
    end: String,
    points: usize,
    distance_km: f64,
    duration_min: f64,
    avg_speed_kmh: f64,
    max_altitude_ft: f64,
}

// Event CSVs exported next to the logs, in name order
fn find_event_files(input_folder: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(input_folder).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file() {
            if let Some(extension) = entry.path().extension() {
                if extension.to_str().unwrap_or("").to_lowercase() == "csv" {
                    files.push(entry.path().to_path_buf());
                }
            }
        }
    }
    files.sort();
    Ok(files)
}

// Returns the stream plus the number of rows csv could not deserialize
fn load_stream(path: &Path) -> Result<(EventStream, usize), Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let mut rdr = Reader::from_reader(file);
    let mut records = Vec::new();
    let mut unreadable = 0;

    for result in rdr.deserialize::<EventRecord>() {
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                log::warn!("{}: unreadable row: {}", path.display(), e);
                unreadable += 1;
            }
        }
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let stream = EventStream::from_records(name, records);

    let skipped = unreadable + stream.rejected();
    if skipped > 0 {
        println!("   📄 {}: {} events ({} skipped)", stream.source_file(), stream.len(), skipped);
    } else {
        println!("   📄 {}: {} events", stream.source_file(), stream.len());
    }
    Ok((stream, unreadable))
}

fn save_rows<T: Serialize>(rows: &[T], path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn save_sightings(report: &AnalysisReport, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let rows: Vec<SightingRow> = match &report.near_target {
        Some(near) => near
            .iter()
            .map(|l| sighting_row(&l.correlated, Some(l.distance_m)))
            .collect(),
        None => report.sightings.iter().map(|c| sighting_row(c, None)).collect(),
    };
    save_rows(&rows, path)
}

fn sighting_row(c: &sync_geo_analyzer::CorrelatedSighting, distance: Option<f64>) -> SightingRow {
    SightingRow {
        source_file: c.fix.source_file.clone(),
        sighting_time: c.sighting.timestamp.to_string(),
        fix_time: c.fix.timestamp.to_string(),
        time_delta_s: c.time_delta_secs,
        bssid: c.sighting.bssid.clone(),
        ssid: c.sighting.display_ssid().to_string(),
        signal: c.sighting.signal_strength,
        latitude: c.fix.point.latitude,
        longitude: c.fix.point.longitude,
        distance_to_target_m: distance,
    }
}

fn save_clusters(report: &AnalysisReport, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let total = report.fixes.len();
    let rows: Vec<ClusterRow> = report
        .clusters
        .iter()
        .enumerate()
        .map(|(i, c)| ClusterRow {
            rank: i + 1,
            centroid_lat: c.centroid.latitude,
            centroid_lon: c.centroid.longitude,
            points: c.count,
            share_percent: c.share_percent(total),
            first_visit: c.first_visit().map(|t| t.to_string()).unwrap_or_default(),
            last_visit: c.last_visit().map(|t| t.to_string()).unwrap_or_default(),
        })
        .collect();
    save_rows(&rows, path)
}

fn save_trips(report: &AnalysisReport, output_folder: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut rows = Vec::new();

    for trip in &report.segmentation.trips {
        let gpx_file = format!("{}.gpx", trip.file_stem());
        let writer = BufWriter::new(File::create(output_folder.join(&gpx_file))?);
        write_trip_gpx(trip, writer)?;

        println!("   ✓ {}", gpx_file);
        println!("       {} → {}", trip.start.format("%Y-%m-%d %H:%M:%S"), trip.end.format("%H:%M:%S"));
        println!("       {:.1} min, {:.2} km, {} points",
                 trip.duration_s / 60.0, trip.distance_m / 1000.0, trip.len());

        rows.push(TripRow {
            gpx_file,
            start: trip.start.to_string(),
            end: trip.end.to_string(),
            points: trip.len(),
            distance_km: trip.distance_m / 1000.0,
            duration_min: trip.duration_s / 60.0,
            avg_speed_kmh: trip.avg_speed_kmh,
            max_altitude_ft: trip
                .points
                .iter()
                .map(|f| f.altitude_ft())
                .fold(f64::MIN, f64::max),
        });
    }

    save_rows(&rows, &output_folder.join("trips.csv"))
}

fn print_summary(report: &AnalysisReport, config: &AnalyzerConfig, unreadable_rows: usize) {
    let stats = &report.decode_stats;
    println!("\n📊 SUMMARY");
    println!("==========");
    println!("• Files processed: {}", report.files);
    println!("• GPS points: {} valid, {} filtered (including 0.0,0.0 invalid fixes)",
             stats.accepted, stats.filtered());
    let skipped = report.rejected_records + unreadable_rows;
    if skipped > 0 {
        println!("• Malformed records skipped: {} ({} unreadable rows, {} invalid records)",
                 skipped, unreadable_rows, report.rejected_records);
    }
    println!("• WiFi sightings located: {}/{}", report.sightings.len(), report.wifi_sightings);
    println!("• Telemetry samples located: {}", report.telemetry.len());
    if let Some(near) = &report.near_target {
        println!("• Sightings within {:.0} m of target: {}", config.wifi.radius_m, near.len());
        for ssid in summarize_by_ssid(near.iter().map(|l| &l.correlated.sighting)).iter().take(5) {
            println!("    {}: {} detections, {} access points, signal {}..{}",
                     ssid.ssid.as_deref().unwrap_or(sync_geo_analyzer::model::HIDDEN_SSID_LABEL),
                     ssid.detections, ssid.unique_bssids, ssid.min_signal, ssid.max_signal);
        }
    }

    let summary = report.location_summary(config.clustering.top_n);
    println!("• Unique locations (~{:.0} m): {}", config.clustering.radius_m, summary.cluster_count);
    for (i, c) in summary.top.iter().enumerate() {
        println!("    #{} [{:.6}, {:.6}] {} points ({:.1}%)",
                 i + 1, c.centroid.latitude, c.centroid.longitude, c.count,
                 c.share_percent(summary.total_points));
    }
    println!("• Trips: {} ({} short runs discarded)",
             report.segmentation.trips.len(), report.segmentation.discarded);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let input_folder = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));
    let config = match args.next() {
        Some(path) => AnalyzerConfig::from_json_file(path)?,
        None => AnalyzerConfig::default(),
    };

    println!("\n🛰️  SYNC LOG GEO ANALYSIS");
    println!("========================");
    println!("📁 Input folder: {}", input_folder.display());
    println!("⏱️  Correlation window: ±{} lines, ±{}s", config.correlation.window_lines, config.correlation.window_seconds);
    println!("🚗 Trip gap: {}s, minimum {} points", config.trips.gap_secs, config.trips.min_points);

    let files = find_event_files(&input_folder)?;
    if files.is_empty() {
        println!("❌ No event CSV files found");
        return Ok(());
    }
    println!("🔍 Found {} event files\n", files.len());

    let mut streams = Vec::with_capacity(files.len());
    let mut unreadable_rows = 0;
    for path in &files {
        match load_stream(path) {
            Ok((stream, unreadable)) => {
                unreadable_rows += unreadable;
                streams.push(stream);
            }
            Err(e) => println!("   ❌ {}: {}", path.display(), e),
        }
    }

    let report = Analyzer::new(config).run(&streams);

    let output_folder = input_folder.join(OUTPUT_DIR);
    fs::create_dir_all(&output_folder)?;
    println!("\n💾 Writing results to {}", output_folder.display());

    save_sightings(&report, &output_folder.join("correlated_sightings.csv"))?;
    save_clusters(&report, &output_folder.join("clusters.csv"))?;
    save_trips(&report, &output_folder)?;

    print_summary(&report, &config, unreadable_rows);
    Ok(())
}
