use anyhow::Result;
use bill_dashboard::{
    Bill, BillError, BillForm, BillSource, BillStatus, Dashboard, FieldError, LoadState,
    Preferences, SortField,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;

// ============================================================================
// MODES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    BillId,
    PatronName,
    Description,
    HouseAction,
    SenateAction,
    GovernorAction,
    Status,
}

impl FormField {
    const ORDER: [FormField; 7] = [
        FormField::BillId,
        FormField::PatronName,
        FormField::Description,
        FormField::HouseAction,
        FormField::SenateAction,
        FormField::GovernorAction,
        FormField::Status,
    ];

    pub fn next(&self) -> Self {
        let idx = Self::ORDER.iter().position(|f| f == self).unwrap_or(0);
        Self::ORDER[(idx + 1) % Self::ORDER.len()]
    }

    pub fn previous(&self) -> Self {
        let idx = Self::ORDER.iter().position(|f| f == self).unwrap_or(0);
        Self::ORDER[(idx + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn label(&self) -> &str {
        match self {
            FormField::BillId => "Bill ID",
            FormField::PatronName => "Patron Name",
            FormField::Description => "Description",
            FormField::HouseAction => "House Action",
            FormField::SenateAction => "Senate Action",
            FormField::GovernorAction => "Governor Action",
            FormField::Status => "Status",
        }
    }

    /// Key used by FieldError for this input
    pub fn error_key(&self) -> &str {
        match self {
            FormField::BillId => "billId",
            FormField::PatronName => "patronName",
            FormField::Description => "description",
            FormField::HouseAction => "houseAction",
            FormField::SenateAction => "senateAction",
            FormField::GovernorAction => "governorAction",
            FormField::Status => "status",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormState {
    /// None = adding, Some(id) = editing that bill
    pub editing: Option<String>,
    pub form: BillForm,
    pub focus: FormField,
    pub errors: Vec<FieldError>,
}

impl FormState {
    fn add() -> Self {
        FormState {
            editing: None,
            form: BillForm::default(),
            focus: FormField::BillId,
            errors: Vec::new(),
        }
    }

    fn edit(bill: &Bill) -> Self {
        FormState {
            editing: Some(bill.id.clone()),
            form: BillForm::from(bill),
            focus: FormField::BillId,
            errors: Vec::new(),
        }
    }

    fn value(&self, field: FormField) -> &str {
        match field {
            FormField::BillId => &self.form.bill_id,
            FormField::PatronName => &self.form.patron_name,
            FormField::Description => &self.form.description,
            FormField::HouseAction => &self.form.house_action,
            FormField::SenateAction => &self.form.senate_action,
            FormField::GovernorAction => &self.form.governor_action,
            FormField::Status => &self.form.status,
        }
    }

    /// Text inputs only; status is picked with ←/→
    fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::BillId => Some(&mut self.form.bill_id),
            FormField::PatronName => Some(&mut self.form.patron_name),
            FormField::Description => Some(&mut self.form.description),
            FormField::HouseAction => Some(&mut self.form.house_action),
            FormField::SenateAction => Some(&mut self.form.senate_action),
            FormField::GovernorAction => Some(&mut self.form.governor_action),
            FormField::Status => None,
        }
    }

    fn cycle_status(&mut self, forward: bool) {
        let current = self.form.status.parse::<BillStatus>().unwrap_or_default();
        let next = if forward { current.next() } else { current.previous() };
        self.form.status = next.as_str().to_string();
    }

    fn error_for(&self, field: FormField) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field.error_key())
    }
}

#[derive(Debug, Clone)]
pub enum Mode {
    Normal,
    Search,
    StatusMenu,
    Form(FormState),
    ConfirmDelete(String),
}

// ============================================================================
// THEME
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub text: Color,
    pub muted: Color,
    pub border: Color,
    pub accent: Color,
    pub header_bg: Color,
    pub highlight_bg: Color,
}

impl Palette {
    pub fn for_mode(dark: bool) -> Self {
        if dark {
            Palette {
                text: Color::White,
                muted: Color::DarkGray,
                border: Color::Gray,
                accent: Color::Cyan,
                header_bg: Color::DarkGray,
                highlight_bg: Color::Rgb(40, 44, 52),
            }
        } else {
            Palette {
                text: Color::Black,
                muted: Color::Gray,
                border: Color::DarkGray,
                accent: Color::Blue,
                header_bg: Color::Gray,
                highlight_bg: Color::Rgb(220, 228, 240),
            }
        }
    }
}

fn status_color(status: BillStatus) -> Color {
    match status {
        BillStatus::Passed | BillStatus::Approved => Color::Green,
        BillStatus::Vetoed | BillStatus::Failed => Color::Red,
        BillStatus::Pending | BillStatus::CarriedOver => Color::Yellow,
    }
}

// ============================================================================
// APP
// ============================================================================

pub struct App {
    pub dashboard: Dashboard,
    source: Box<dyn BillSource>,
    pub preferences: Preferences,
    preferences_dir: Option<PathBuf>,
    export_dir: PathBuf,
    pub state: TableState,
    pub show_detail: bool,
    pub mode: Mode,
    pub message: Option<String>,
}

impl App {
    pub fn new(
        dashboard: Dashboard,
        source: Box<dyn BillSource>,
        preferences: Preferences,
        preferences_dir: Option<PathBuf>,
        export_dir: PathBuf,
    ) -> Self {
        let mut app = Self {
            dashboard,
            source,
            preferences,
            preferences_dir,
            export_dir,
            state: TableState::default(),
            show_detail: false,
            mode: Mode::Normal,
            message: None,
        };
        app.sync_selection();
        app
    }

    pub fn palette(&self) -> Palette {
        Palette::for_mode(self.preferences.dark_mode)
    }

    pub fn selected_bill(&self) -> Option<&Bill> {
        let page = self.dashboard.page();
        let id = self
            .state
            .selected()
            .and_then(|i| page.bills.get(i))
            .map(|b| b.id.clone())?;
        self.dashboard.get(&id)
    }

    fn page_len(&self) -> usize {
        self.dashboard.page().bills.len()
    }

    /// Keep the highlighted row inside the current page
    fn sync_selection(&mut self) {
        let len = self.page_len();
        match self.state.selected() {
            _ if len == 0 => self.state.select(None),
            Some(i) if i >= len => self.state.select(Some(len - 1)),
            None => self.state.select(Some(0)),
            _ => {}
        }
    }

    fn reset_selection(&mut self) {
        self.state.select(None);
        self.sync_selection();
    }

    pub fn next(&mut self) {
        let len = self.page_len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.page_len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn refresh(&mut self) {
        self.message = match self.dashboard.load_from(self.source.as_ref()) {
            Ok(report) if report.skipped > 0 => Some(format!(
                "Loaded {} bills ({} unusable records skipped)",
                report.loaded, report.skipped
            )),
            Ok(report) => Some(format!("Loaded {} bills", report.loaded)),
            Err(err) => Some(format!("Refresh failed: {}", err)),
        };
        self.reset_selection();
    }

    pub fn toggle_dark_mode(&mut self) {
        let dark = self.preferences.toggle_dark_mode();
        if let Some(dir) = &self.preferences_dir {
            if let Err(err) = self.preferences.save(dir) {
                tracing::warn!(error = %err, "could not save preferences");
                self.message = Some(format!("Could not save preference: {}", err));
                return;
            }
        }
        self.message = Some(if dark { "Dark mode on" } else { "Dark mode off" }.to_string());
    }

    fn export(&mut self) {
        self.message = match self.dashboard.export_csv(&self.export_dir) {
            Ok(path) => Some(format!(
                "Exported {} bills to {}",
                self.dashboard.total_bills(),
                path.display()
            )),
            Err(err) => Some(format!("Export failed: {}", err)),
        };
    }

    fn submit_form(&mut self, mut form_state: FormState) {
        let result = match &form_state.editing {
            Some(id) => self.dashboard.update_bill(id, &form_state.form).map(|_| id.clone()),
            None => self.dashboard.add_bill(&form_state.form),
        };

        match result {
            Ok(_) => {
                self.message = Some(
                    if form_state.editing.is_some() {
                        format!("Saved {}", form_state.form.bill_id.trim())
                    } else {
                        format!("Added {}", form_state.form.bill_id.trim())
                    },
                );
                self.mode = Mode::Normal;
            }
            Err(BillError::Validation(errors)) => {
                if let Some(first) = errors.first() {
                    if let Some(field) = FormField::ORDER.iter().find(|f| f.error_key() == first.field) {
                        form_state.focus = *field;
                    }
                }
                form_state.errors = errors;
                self.mode = Mode::Form(form_state);
            }
            Err(err) => {
                self.message = Some(err.to_string());
                self.mode = Mode::Normal;
            }
        }
    }

    /// Returns true when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let quit = match mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Search => {
                self.handle_search_key(key);
                false
            }
            Mode::StatusMenu => {
                self.handle_status_menu_key(key);
                false
            }
            Mode::Form(form_state) => {
                self.handle_form_key(form_state, key);
                false
            }
            Mode::ConfirmDelete(id) => {
                if let KeyCode::Char('y') | KeyCode::Char('Y') = key.code {
                    self.message = match self.dashboard.delete_bill(&id) {
                        Ok(bill) => Some(format!("Deleted {}", bill.bill_id)),
                        Err(err) => Some(err.to_string()),
                    };
                } else {
                    self.message = Some("Delete cancelled".to_string());
                }
                false
            }
        };
        self.sync_selection();
        quit
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Enter => self.show_detail = !self.show_detail,
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Home => self.state.select(Some(0)),
            KeyCode::End => {
                let len = self.page_len();
                if len > 0 {
                    self.state.select(Some(len - 1));
                }
            }
            KeyCode::Right | KeyCode::PageDown => {
                self.dashboard.next_page();
                self.reset_selection();
            }
            KeyCode::Left | KeyCode::PageUp => {
                self.dashboard.previous_page();
                self.reset_selection();
            }
            KeyCode::Char('+') => {
                self.dashboard.cycle_page_size(true);
                self.reset_selection();
            }
            KeyCode::Char('-') => {
                self.dashboard.cycle_page_size(false);
                self.reset_selection();
            }
            KeyCode::Char('/') => self.mode = Mode::Search,
            KeyCode::Char('s') => self.mode = Mode::StatusMenu,
            KeyCode::Char('n') => {
                self.dashboard.toggle_new_only();
                self.reset_selection();
            }
            KeyCode::Char('c') => {
                self.dashboard.clear_filters();
                self.reset_selection();
            }
            KeyCode::Char('b') => self.sort_by(SortField::BillId),
            KeyCode::Char('p') => self.sort_by(SortField::PatronName),
            KeyCode::Char('t') => self.sort_by(SortField::Status),
            KeyCode::Char('i') => self.sort_by(SortField::CreatedAt),
            KeyCode::Char('a') => self.mode = Mode::Form(FormState::add()),
            KeyCode::Char('e') => {
                if let Some(bill) = self.selected_bill() {
                    self.mode = Mode::Form(FormState::edit(bill));
                }
            }
            KeyCode::Char('x') => {
                if let Some(bill) = self.selected_bill() {
                    self.mode = Mode::ConfirmDelete(bill.id.clone());
                }
            }
            KeyCode::Char('m') => {
                let cleared = self.dashboard.mark_all_read();
                self.message = Some(format!("Marked {} bills as read", cleared));
            }
            KeyCode::Char('E') => self.export(),
            KeyCode::Char('d') => self.toggle_dark_mode(),
            KeyCode::Char('r') => self.refresh(),
            _ => {}
        }
        false
    }

    fn sort_by(&mut self, field: SortField) {
        self.dashboard.toggle_sort(field);
        self.reset_selection();
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let mut search = self.dashboard.filters().search.clone();
        match key.code {
            KeyCode::Enter | KeyCode::Esc => return,
            KeyCode::Backspace => {
                search.pop();
            }
            KeyCode::Char(c) => search.push(c),
            _ => {}
        }
        self.dashboard.set_search(search);
        self.reset_selection();
        self.mode = Mode::Search;
    }

    fn handle_status_menu_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('s') => return,
            KeyCode::Char(c @ '1'..='6') => {
                let idx = c as usize - '1' as usize;
                self.dashboard.toggle_status_filter(BillStatus::ALL[idx]);
                self.reset_selection();
            }
            _ => {}
        }
        self.mode = Mode::StatusMenu;
    }

    fn handle_form_key(&mut self, mut form_state: FormState, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.message = Some("Edit cancelled".to_string());
                return;
            }
            KeyCode::Enter => {
                self.submit_form(form_state);
                return;
            }
            KeyCode::Tab | KeyCode::Down => form_state.focus = form_state.focus.next(),
            KeyCode::BackTab | KeyCode::Up => form_state.focus = form_state.focus.previous(),
            KeyCode::Left if form_state.focus == FormField::Status => form_state.cycle_status(false),
            KeyCode::Right if form_state.focus == FormField::Status => form_state.cycle_status(true),
            KeyCode::Backspace => {
                if let Some(text) = form_state.text_mut(form_state.focus) {
                    text.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(text) = form_state.text_mut(form_state.focus) {
                    text.push(c);
                }
            }
            _ => {}
        }
        self.mode = Mode::Form(form_state);
    }
}

// ============================================================================
// EVENT LOOP
// ============================================================================

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui(f: &mut Frame, app: &mut App) {
    let show_pager = app.dashboard.total_pages() > 1;
    let failed = matches!(app.dashboard.load_state(), LoadState::Failed(_));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                              // Header
            Constraint::Length(if failed { 3 } else { 0 }),     // Fetch error banner
            Constraint::Length(3),                              // Filter bar
            Constraint::Min(0),                                 // Table
            Constraint::Length(if show_pager { 1 } else { 0 }), // Pager
            Constraint::Length(3),                              // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    if failed {
        render_error_banner(f, chunks[1], app);
    }
    render_filter_bar(f, chunks[2], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[3]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[3], app);
    }

    if show_pager {
        render_pager(f, chunks[4], app);
    }
    render_status_bar(f, chunks[5], app);

    match &app.mode {
        Mode::StatusMenu => render_status_menu(f, app),
        Mode::Form(form_state) => render_form(f, form_state, app.palette()),
        Mode::ConfirmDelete(id) => render_confirm_delete(f, id, app),
        Mode::Normal | Mode::Search => {}
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let palette = app.palette();
    let last_updated = app
        .dashboard
        .last_updated()
        .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    let mut spans = vec![
        Span::styled(
            "Virginia Legislative Bills Dashboard",
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  │  "),
        Span::styled(format!("Last updated: {}", last_updated), Style::default().fg(palette.muted)),
    ];

    let new_count = app.dashboard.new_count();
    if new_count > 0 {
        spans.push(Span::raw("  │  "));
        spans.push(Span::styled(
            format!("● {} new", new_count),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(" (m mark read)", Style::default().fg(palette.muted)));
    }

    spans.push(Span::raw("  │  "));
    spans.push(Span::styled(
        if app.preferences.dark_mode { "☾ dark" } else { "☀ light" },
        Style::default().fg(palette.muted),
    ));

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.accent)),
    );
    f.render_widget(header, area);
}

fn render_error_banner(f: &mut Frame, area: Rect, app: &App) {
    let msg = match app.dashboard.load_state() {
        LoadState::Failed(msg) => msg.as_str(),
        _ => return,
    };

    let banner = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", msg),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" press "),
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" to retry"),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Could not load bills "),
    );
    f.render_widget(banner, area);
}

fn render_filter_bar(f: &mut Frame, area: Rect, app: &App) {
    let palette = app.palette();
    let filters = app.dashboard.filters();
    let searching = matches!(app.mode, Mode::Search);

    let search_text = if searching {
        format!("{}▏", filters.search)
    } else if filters.search.is_empty() {
        "Search by Bill ID, description, or patron...".to_string()
    } else {
        filters.search.clone()
    };
    let search_style = if searching {
        Style::default().fg(palette.text).add_modifier(Modifier::UNDERLINED)
    } else if filters.search.is_empty() {
        Style::default().fg(palette.muted)
    } else {
        Style::default().fg(palette.text)
    };

    let statuses = if filters.statuses.is_empty() {
        "all".to_string()
    } else {
        filters
            .statuses
            .iter()
            .map(|s| s.label())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let total = app.dashboard.total_bills();
    let mut spans = vec![
        Span::styled("/ ", Style::default().fg(Color::Yellow)),
        Span::styled(search_text, search_style),
        Span::raw("  │  "),
        Span::styled("Status: ", Style::default().fg(palette.accent)),
        Span::raw(statuses),
    ];
    if filters.show_new_only {
        spans.push(Span::raw("  │  "));
        spans.push(Span::styled("New bills only", Style::default().fg(Color::Green)));
    }
    spans.push(Span::raw("  │  "));
    spans.push(Span::styled(
        format!("{} bill{}", total, if total == 1 { "" } else { "s" }),
        Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
    ));

    let bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title(" Filters "),
    );
    f.render_widget(bar, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let palette = app.palette();
    let sort = app.dashboard.sort();
    let page = app.dashboard.page();

    if page.bills.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No bills found", Style::default().fg(palette.text))),
            Line::from(Span::styled(
                "Try adjusting your filters or add a new bill",
                Style::default().fg(palette.muted),
            )),
        ])
        .alignment(ratatui::layout::Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border))
                .title(" Bills "),
        );
        f.render_widget(empty, area);
        return;
    }

    let column_title = |field: SortField| {
        if sort.field == field {
            format!("{} {}", field.title(), sort.direction.arrow())
        } else {
            field.title().to_string()
        }
    };

    let header_cells = vec![
        Cell::from(column_title(SortField::BillId)),
        Cell::from("Description"),
        Cell::from(column_title(SortField::PatronName)),
        Cell::from(column_title(SortField::CreatedAt)),
        Cell::from(column_title(SortField::Status)),
    ]
    .into_iter()
    .map(|cell| cell.style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));

    let header = Row::new(header_cells)
        .style(Style::default().bg(palette.header_bg))
        .height(1);

    let rows = page.bills.iter().map(|bill| {
        let color = status_color(bill.status);
        let marker = if bill.is_new { "● " } else { "  " };

        let cells = vec![
            Cell::from(format!("{}{}", marker, bill.bill_id)),
            Cell::from(truncate(&bill.description, 40)),
            Cell::from(truncate(&bill.patron_name, 24)),
            Cell::from(
                bill.created_at
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d")
                    .to_string(),
            ),
            Cell::from(bill.status.label()).style(Style::default().fg(color)),
        ];

        let style = if bill.is_new {
            Style::default().fg(palette.text).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.text)
        };
        Row::new(cells).style(style).height(1)
    });

    let title = format!(" Bills - page {} of {} ", page.current_page, page.total_pages.max(1));
    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Min(20),
            Constraint::Length(26),
            Constraint::Length(13),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(palette.highlight_bg)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_pager(f: &mut Frame, area: Rect, app: &App) {
    let palette = app.palette();
    let page = app.dashboard.current_page();
    let pages = app.dashboard.total_pages();
    let size = app.dashboard.page_size().get();
    let total = app.dashboard.total_bills();
    let first = (page - 1) * size + 1;
    let last = (page * size).min(total);

    let pager = Paragraph::new(Line::from(vec![
        Span::styled(" ← ", Style::default().fg(Color::Yellow)),
        Span::raw(format!("Page {} of {}", page, pages)),
        Span::styled(" → ", Style::default().fg(Color::Yellow)),
        Span::styled(
            format!("  Showing {}-{} of {}  │  {} per page (+/-)", first.min(total), last, total, size),
            Style::default().fg(palette.muted),
        ),
    ]));
    f.render_widget(pager, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let palette = app.palette();
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let mut spans = vec![];
    if let Some(msg) = &app.message {
        spans.push(Span::styled(format!(" {} ", msg), Style::default().fg(Color::Green)));
        spans.push(Span::raw("│ "));
    }

    match app.mode {
        Mode::Search => {
            spans.push(Span::raw("Typing search… "));
            spans.push(key("Enter/Esc"));
            spans.push(Span::raw(" done"));
        }
        _ => {
            for (k, label) in [
                ("/", " Search "),
                ("s", " Status "),
                ("n", " New "),
                ("c", " Clear "),
                ("b/p/t/i", " Sort "),
                ("a/e/x", " Add/Edit/Del "),
                ("E", " Export "),
                ("d", " Theme "),
                ("r", " Refresh "),
            ] {
                spans.push(key(k));
                spans.push(Span::styled(label, Style::default().fg(palette.text)));
            }
            spans.push(Span::styled("q", Style::default().fg(Color::Red)));
            spans.push(Span::raw(" Quit"));
        }
    }

    let bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border)),
    );
    f.render_widget(bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let palette = app.palette();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Bill Details ");

    let bill = match app.selected_bill() {
        Some(b) => b,
        None => {
            f.render_widget(Paragraph::new("No bill selected").block(block), area);
            return;
        }
    };

    let label = |text: &'static str| {
        Span::styled(text, Style::default().fg(palette.accent).add_modifier(Modifier::BOLD))
    };
    let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
    let local = |t: chrono::DateTime<chrono::Utc>| {
        t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string()
    };

    let content = vec![
        Line::from(vec![label("Bill: "), Span::raw(bill.bill_id.clone())]),
        Line::from(vec![
            label("Status: "),
            Span::styled(bill.status.label(), Style::default().fg(status_color(bill.status))),
        ]),
        Line::from(vec![label("Patron: "), Span::raw(bill.patron_name.clone())]),
        Line::from(""),
        Line::from(label("Full Description")),
        Line::from(bill.description.clone()),
        Line::from(""),
        Line::from(vec![label("House: "), Span::raw(or_dash(&bill.house_action))]),
        Line::from(vec![label("Senate: "), Span::raw(or_dash(&bill.senate_action))]),
        Line::from(vec![label("Governor: "), Span::raw(or_dash(&bill.governor_action))]),
        Line::from(""),
        Line::from(label("Timestamps")),
        Line::from(Span::styled(
            format!("Created: {}", local(bill.created_at)),
            Style::default().fg(palette.muted),
        )),
        Line::from(Span::styled(
            format!("Updated: {}", local(bill.updated_at)),
            Style::default().fg(palette.muted),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to close",
            Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
        )),
    ];

    let detail = Paragraph::new(content).wrap(Wrap { trim: true }).block(block);
    f.render_widget(detail, area);
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_status_menu(f: &mut Frame, app: &App) {
    let palette = app.palette();
    let selected = &app.dashboard.filters().statuses;

    let mut lines = vec![Line::from("")];
    for (i, status) in BillStatus::ALL.iter().enumerate() {
        let checked = if selected.contains(status) { "[x]" } else { "[ ]" };
        lines.push(Line::from(vec![
            Span::styled(format!("  {} ", i + 1), Style::default().fg(Color::Yellow)),
            Span::raw(format!("{} ", checked)),
            Span::styled(status.label(), Style::default().fg(status_color(*status))),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  1-6 toggle, Esc close",
        Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
    )));

    let area = centered_rect(30, 11, f.size());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent))
                .title(" Status "),
        ),
        area,
    );
}

fn render_form(f: &mut Frame, form_state: &FormState, palette: Palette) {
    let mut lines = vec![];
    for field in FormField::ORDER {
        let focused = form_state.focus == field;
        let marker = if focused { "→ " } else { "  " };
        let value = match field {
            FormField::Status => {
                let label = form_state
                    .form
                    .status
                    .parse::<BillStatus>()
                    .map(|s| s.label().to_string())
                    .unwrap_or_else(|_| form_state.form.status.clone());
                format!("◀ {} ▶", label)
            }
            _ if focused => format!("{}▏", form_state.value(field)),
            _ => form_state.value(field).to_string(),
        };

        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Yellow)),
            Span::styled(
                format!("{:<16}", field.label()),
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                truncate(&value, 60),
                if focused {
                    Style::default().fg(palette.text).add_modifier(Modifier::UNDERLINED)
                } else {
                    Style::default().fg(palette.text)
                },
            ),
        ]));

        if let Some(err) = form_state.error_for(field) {
            lines.push(Line::from(Span::styled(
                format!("                  {}", err.message),
                Style::default().fg(Color::Red),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Tab/↑↓ move  ←/→ status  Enter save  Esc cancel",
        Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
    )));

    let title = if form_state.editing.is_some() { " Edit Bill " } else { " Add New Bill " };
    let height = lines.len() as u16 + 2;
    let area = centered_rect(70, height, f.size());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent))
                .title(title),
        ),
        area,
    );
}

fn render_confirm_delete(f: &mut Frame, id: &str, app: &App) {
    let palette = app.palette();
    let name = app
        .dashboard
        .get(id)
        .map(|b| b.bill_id.clone())
        .unwrap_or_else(|| id.to_string());

    let area = centered_rect(40, 5, f.size());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(vec![
            Line::from(""),
            Line::from(vec![
                Span::raw(format!("  Delete {}? ", name)),
                Span::styled("y", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                Span::raw("/n"),
            ]),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Confirm "),
        )
        .style(Style::default().fg(palette.text)),
        area,
    );
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bill_dashboard::{BillStore, ManualClock, RawBill, StaticSource};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(press(KeyCode::Char(c)));
        }
    }

    fn test_app(count: u32) -> App {
        let raws: Vec<RawBill> = (1..=count)
            .map(|n| RawBill {
                bill_id: Some(format!("HB {}", n)),
                description: Some(format!("Bill number {}", n)),
                patron_name: Some("Delegate Smith".to_string()),
                introduction_date: Some(format!("2025-01-{:02}", n)),
                vetoed: Some(if n % 2 == 0 { "Yes" } else { "No" }.to_string()),
                ..Default::default()
            })
            .collect();

        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 7, 15, 0, 0).unwrap()));
        let source = StaticSource::new(raws);
        let mut dashboard = Dashboard::new(BillStore::with_clock(clock));
        dashboard.load_from(&source).unwrap();

        App::new(
            dashboard,
            Box::new(source),
            Preferences::default(),
            None,
            std::env::temp_dir(),
        )
    }

    #[test]
    fn test_quit_keys() {
        let mut app = test_app(3);
        assert!(app.handle_key(press(KeyCode::Char('q'))));
        assert!(app.handle_key(press(KeyCode::Esc)));
    }

    #[test]
    fn test_row_navigation_wraps_within_page() {
        let mut app = test_app(3);
        assert_eq!(app.state.selected(), Some(0));

        app.handle_key(press(KeyCode::Up));
        assert_eq!(app.state.selected(), Some(2));
        app.handle_key(press(KeyCode::Down));
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_search_mode_filters_as_you_type() {
        let mut app = test_app(20);
        app.handle_key(press(KeyCode::Char('/')));
        assert!(matches!(app.mode, Mode::Search));

        type_text(&mut app, "hb 1");
        assert!(!app.handle_key(press(KeyCode::Char('9'))));
        assert_eq!(app.dashboard.filters().search, "hb 19");
        assert_eq!(app.dashboard.total_bills(), 1);

        app.handle_key(press(KeyCode::Backspace));
        app.handle_key(press(KeyCode::Enter));
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.dashboard.total_bills(), 11);
    }

    #[test]
    fn test_status_menu_toggles() {
        let mut app = test_app(10);
        app.handle_key(press(KeyCode::Char('s')));
        app.handle_key(press(KeyCode::Char('2'))); // vetoed
        app.handle_key(press(KeyCode::Esc));

        assert_eq!(app.dashboard.filters().statuses, vec![BillStatus::Vetoed]);
        assert_eq!(app.dashboard.total_bills(), 5);

        app.handle_key(press(KeyCode::Char('c')));
        assert_eq!(app.dashboard.total_bills(), 10);
    }

    #[test]
    fn test_paging_keys() {
        let mut app = test_app(25);
        app.handle_key(press(KeyCode::Right));
        app.handle_key(press(KeyCode::Right));
        app.handle_key(press(KeyCode::Right));
        assert_eq!(app.dashboard.current_page(), 3);
        assert_eq!(app.state.selected(), Some(0));

        app.handle_key(press(KeyCode::Char('b')));
        assert_eq!(app.dashboard.current_page(), 1);
    }

    #[test]
    fn test_add_bill_through_form() {
        let mut app = test_app(2);
        app.handle_key(press(KeyCode::Char('a')));

        // Submitting empty shows errors and stays in the form
        app.handle_key(press(KeyCode::Enter));
        match &app.mode {
            Mode::Form(state) => {
                assert_eq!(state.errors.len(), 3);
                assert_eq!(state.focus, FormField::BillId);
            }
            other => panic!("expected form, got {:?}", other),
        }

        type_text(&mut app, "SB 42");
        app.handle_key(press(KeyCode::Tab));
        type_text(&mut app, "Senator Brown");
        app.handle_key(press(KeyCode::Tab));
        type_text(&mut app, "Relating to elections");
        for _ in 0..4 {
            app.handle_key(press(KeyCode::Tab));
        }
        app.handle_key(press(KeyCode::Left)); // pending -> approved
        app.handle_key(press(KeyCode::Enter));

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.dashboard.new_count(), 1);
        let added = app
            .dashboard
            .all_bills()
            .iter()
            .find(|b| b.bill_id == "SB 42")
            .unwrap();
        assert_eq!(added.status, BillStatus::Approved);
        assert_eq!(added.patron_name, "Senator Brown");

        app.handle_key(press(KeyCode::Char('m')));
        assert_eq!(app.dashboard.new_count(), 0);
    }

    #[test]
    fn test_edit_and_delete_selected() {
        let mut app = test_app(3);
        let selected_id = app.selected_bill().unwrap().id.clone();

        app.handle_key(press(KeyCode::Char('e')));
        app.handle_key(press(KeyCode::Tab));
        type_text(&mut app, " Jr.");
        app.handle_key(press(KeyCode::Enter));
        assert_eq!(app.dashboard.get(&selected_id).unwrap().patron_name, "Delegate Smith Jr.");

        app.handle_key(press(KeyCode::Char('x')));
        app.handle_key(press(KeyCode::Char('n')));
        assert!(app.dashboard.get(&selected_id).is_some());

        app.handle_key(press(KeyCode::Char('x')));
        app.handle_key(press(KeyCode::Char('y')));
        assert!(app.dashboard.get(&selected_id).is_none());
        assert_eq!(app.dashboard.all_bills().len(), 2);
    }

    #[test]
    fn test_dark_mode_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(1);
        app.preferences_dir = Some(dir.path().to_path_buf());

        app.handle_key(press(KeyCode::Char('d')));
        assert!(app.preferences.dark_mode);
        assert!(Preferences::load(dir.path()).unwrap().dark_mode);
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Relating to élections", 10), "Relatin...");
    }
}
