// src/cli/render.rs
use chrono::Local;
use clusterdash_core::dashboard::{DashboardView, Mode};
use clusterdash_core::utils::models::{GpuStats, JobState, SchedulerJob, SystemStats, HOT_UTILIZATION_PERCENT};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table},
    Frame,
};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

const GPU_WIDTHS: [Constraint; 7] = [
    Constraint::Length(14),
    Constraint::Length(26),
    Constraint::Length(7),
    Constraint::Length(18),
    Constraint::Length(9),
    Constraint::Length(9),
    Constraint::Length(5),
];

const JOB_WIDTHS: [Constraint; 9] = [
    Constraint::Length(9),
    Constraint::Length(14),
    Constraint::Length(10),
    Constraint::Length(10),
    Constraint::Length(6),
    Constraint::Length(5),
    Constraint::Length(8),
    Constraint::Length(12),
    Constraint::Min(10),
];

/// Draws the whole dashboard for one frame. `frame_count` drives the loading spinner.
pub fn draw<B: Backend>(f: &mut Frame<B>, view: &DashboardView, mode: Mode, frame_count: usize) {
    let gpu_rows = view.snapshot.gpus.len().max(1) as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(5),
                Constraint::Length(3),
                Constraint::Length(gpu_rows + 3),
                Constraint::Min(5),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.size());

    draw_header(f, chunks[0], view, mode, frame_count);
    draw_system(f, chunks[1], &view.snapshot.system);
    draw_gpus(f, chunks[2], &view.snapshot.gpus);
    draw_jobs(f, chunks[3], &view.snapshot.jobs);

    let help = Paragraph::new(Spans::from(vec![
        Span::styled("m", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" toggle live/synthetic   "),
        Span::styled("q", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" quit"),
    ]))
    .style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, chunks[4]);
}

fn mode_label(mode: Mode) -> Span<'static> {
    match mode {
        Mode::Live => Span::styled(
            " LIVE ",
            Style::default().fg(Color::White).bg(Color::Blue).add_modifier(Modifier::BOLD),
        ),
        Mode::Synthetic => Span::styled(
            " SYNTHETIC ",
            Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    }
}

fn draw_header<B: Backend>(
    f: &mut Frame<B>,
    area: Rect,
    view: &DashboardView,
    mode: Mode,
    frame_count: usize,
) {
    let mut status = vec![mode_label(mode)];
    if view.loading {
        status.push(Span::styled(
            format!("  {} loading", SPINNER[frame_count % SPINNER.len()]),
            Style::default().fg(Color::Blue),
        ));
    }

    let updated = view.snapshot.timestamp.with_timezone(&Local);
    let mut last_updated = format!("Last updated: {}", updated.format("%H:%M:%S"));
    if mode == Mode::Live {
        last_updated.push_str(" (from metrics backend)");
    }

    let error_line = match &view.error {
        Some(message) => Spans::from(Span::styled(
            format!("! {}", message),
            Style::default().fg(Color::Red),
        )),
        None => Spans::from(""),
    };

    let header = Paragraph::new(vec![
        Spans::from(status),
        Spans::from(Span::styled(last_updated, Style::default().fg(Color::Gray))),
        error_line,
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(
                "Cluster Dashboard",
                Style::default().add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(header, area);
}

fn percent_gauge(title: &str, value: f64, label: String) -> Gauge<'_> {
    let ratio = if value.is_finite() { (value / 100.0).clamp(0.0, 1.0) } else { 0.0 };
    let color = if value > 90.0 {
        Color::Red
    } else if value > 70.0 {
        Color::Yellow
    } else {
        Color::Green
    };
    Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .gauge_style(Style::default().fg(color).bg(Color::Black))
        .ratio(ratio)
        .label(label)
}

fn draw_system<B: Backend>(f: &mut Frame<B>, area: Rect, system: &SystemStats) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25); 4].as_ref())
        .split(area);

    f.render_widget(
        percent_gauge(
            "CPU Usage",
            system.cpu_usage_percent,
            format!("{:.1}%", system.cpu_usage_percent),
        ),
        cards[0],
    );
    f.render_widget(
        percent_gauge(
            "Memory Usage",
            system.memory_usage_percent,
            format!("{:.1}%", system.memory_usage_percent),
        ),
        cards[1],
    );
    let used = Paragraph::new(format!("{:.1} GB", system.memory_used_gb))
        .block(Block::default().borders(Borders::ALL).title("Memory Used"));
    f.render_widget(used, cards[2]);
    let total = Paragraph::new(format!("{:.1} GB", system.memory_total_gb))
        .block(Block::default().borders(Borders::ALL).title("Total Memory"));
    f.render_widget(total, cards[3]);
}

fn temperature_style(gpu: &GpuStats) -> Style {
    if gpu.is_temperature_elevated() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green)
    }
}

fn utilization_style(gpu: &GpuStats) -> Style {
    if gpu.gpu_utilization > HOT_UTILIZATION_PERCENT {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Blue)
    }
}

fn gpu_row_style(gpu: &GpuStats) -> Style {
    if gpu.is_hot {
        Style::default().bg(Color::Rgb(60, 0, 0))
    } else {
        Style::default()
    }
}

fn short_uuid(uuid: &str) -> &str {
    // "GPU-d49e..." keeps enough to tell devices apart
    uuid.get(..12).unwrap_or(uuid)
}

fn gpu_row(gpu: &GpuStats) -> Row<'_> {
    let hot = if gpu.is_hot {
        Cell::from("HOT").style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
    } else {
        Cell::from("")
    };
    Row::new(vec![
        Cell::from(short_uuid(&gpu.uuid)),
        Cell::from(gpu.gpu_name.as_str()),
        Cell::from(format!("{}°C", gpu.temperature)).style(temperature_style(gpu)),
        Cell::from(format!("{}/{} MiB", gpu.memory_used, gpu.memory_total)),
        Cell::from(format!("{}%", gpu.gpu_utilization)).style(utilization_style(gpu)),
        Cell::from(format!("{}%", gpu.memory_utilization)),
        hot,
    ])
    .style(gpu_row_style(gpu))
}

fn draw_gpus<B: Backend>(f: &mut Frame<B>, area: Rect, gpus: &[GpuStats]) {
    let block = Block::default().borders(Borders::ALL).title("GPU Status");
    if gpus.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No GPUs detected",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let header = Row::new(vec!["UUID", "Name", "Temp", "Memory", "GPU Util", "Mem Util", ""])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let table = Table::new(gpus.iter().map(gpu_row))
        .header(header)
        .block(block)
        .widths(&GPU_WIDTHS)
        .column_spacing(1);
    f.render_widget(table, area);
}

fn job_state_style(state: JobState) -> Style {
    let color = match state {
        JobState::Running => Color::Green,
        JobState::Pending => Color::Yellow,
        JobState::Completed => Color::Blue,
        JobState::Failed => Color::Red,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn job_row(job: &SchedulerJob) -> Row<'_> {
    Row::new(vec![
        Cell::from(job.id.as_str()),
        Cell::from(job.name.as_str()),
        Cell::from(job.user.as_str()),
        Cell::from(job.state.as_str()).style(job_state_style(job.state)),
        Cell::from(job.nodes.to_string()),
        Cell::from(job.cpus.to_string()),
        Cell::from(job.memory.as_str()),
        Cell::from(job.walltime.as_str()),
        Cell::from(job.nodelist.as_str()),
    ])
}

fn draw_jobs<B: Backend>(f: &mut Frame<B>, area: Rect, jobs: &[SchedulerJob]) {
    let block = Block::default().borders(Borders::ALL).title("SLURM Jobs");
    if jobs.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No SLURM jobs found",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let header = Row::new(vec![
        "Job ID", "Name", "User", "State", "Nodes", "CPUs", "Memory", "Walltime", "Nodelist",
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));
    let table = Table::new(jobs.iter().map(job_row))
        .header(header)
        .block(block)
        .widths(&JOB_WIDTHS)
        .column_spacing(1);
    f.render_widget(table, area);
}
