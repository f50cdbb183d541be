use {
    super::outline::Outline,
    crate::view::HitView,
    crossterm::event::{Event, KeyCode, KeyEventKind},
    ratatui::{backend::CrosstermBackend, Terminal},
    std::{
        sync::Arc,
        time::{Duration, Instant},
    },
    tokio::sync::RwLock,
};

/// Run the TUI event loop
///
/// Redraws only when the view generation changes, a key changes the outline,
/// the terminal is resized, or once per second for the age columns.
pub async fn run_ui(view: Arc<RwLock<HitView>>) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = std::io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    crossterm::terminal::enable_raw_mode()?;

    // Alternate screen keeps stderr logs from scribbling over the table
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::cursor::Hide
    )?;

    terminal.clear()?;

    let result = event_loop(&mut terminal, view).await;

    // Restore terminal state even if the loop failed
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    crossterm::terminal::disable_raw_mode()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    view: Arc<RwLock<HitView>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut outline = Outline::new();
    let mut last_generation = None;
    let mut last_draw = Instant::now();
    let input_timeout = Duration::from_millis(250);
    let clock_refresh = Duration::from_secs(1);

    loop {
        let mut needs_draw = false;

        if crossterm::event::poll(input_timeout)? {
            match crossterm::event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Down | KeyCode::Char('j') => {
                        let view = view.read().await;
                        outline.select_next(outline.visible_rows(view.nodes()).len());
                        needs_draw = true;
                    }
                    KeyCode::Up | KeyCode::Char('k') => {
                        outline.select_previous();
                        needs_draw = true;
                    }
                    KeyCode::Enter | KeyCode::Char(' ') => {
                        let view = view.read().await;
                        needs_draw = outline.toggle_selected(view.nodes());
                    }
                    _ => {}
                },
                Event::Resize(_, _) => needs_draw = true,
                _ => {}
            }
        }

        let view = view.read().await;
        if last_generation != Some(view.generation()) {
            outline.sync(view.nodes());
            last_generation = Some(view.generation());
            needs_draw = true;
        }

        if needs_draw || last_draw.elapsed() >= clock_refresh {
            let now = chrono::Utc::now();
            terminal.draw(|f| {
                let area = f.area();
                crate::ui::layout::render_layout(f, area, &view, &outline, now);
            })?;
            last_draw = Instant::now();
        }
    }

    Ok(())
}
