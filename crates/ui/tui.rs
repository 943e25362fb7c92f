use std::{error::Error, io};

use crate::data::{self, Data};
use config::CurrencyFormat;
use log::{debug, error};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    crossterm::{
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    },
    layout::{Constraint, Layout, Margin, Rect},
    style::{self, Color, Modifier, Style, Stylize},
    symbols,
    Frame, Terminal,
    text::{Line, Span, Text},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, BorderType, Cell, Chart, Dataset, GraphType,
        HighlightSpacing, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState,
        Sparkline, Table, TableState, Tabs,
    },
};
use rental::{AppState, Bin, Dashboard, Month, Share, Step};
use style::palette::tailwind;
use unicode_width::UnicodeWidthStr;

const PALETTES: [tailwind::Palette; 4] = [
    tailwind::BLUE,
    tailwind::EMERALD,
    tailwind::INDIGO,
    tailwind::RED,
];
const INFO_TEXT: &str = "(Esc) quit | (←/→) page | ([ ]) start ±day | ({ }) start ±month \
     | (- =) end ±day | (_ +) end ±month | (r) reset | (c) color";

const PAGES: [&str; 7] = [
    "Overview",
    "RFM",
    "Monthly trend",
    "Season × weather",
    "Users by year",
    "Holiday / working day",
    "Weekday",
];

const ITEM_HEIGHT: usize = 1;

#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub histogram_bins: usize,
    pub currency: CurrencyFormat,
}

struct TableColors {
    buffer_bg: Color,
    header_bg: Color,
    header_fg: Color,
    row_fg: Color,
    selected_style_fg: Color,
    normal_row_color: Color,
    alt_row_color: Color,
    footer_border_color: Color,
    bar_color: Color,
    alt_bar_color: Color,
}

impl TableColors {
    const fn new(color: &tailwind::Palette) -> Self {
        Self {
            buffer_bg: tailwind::SLATE.c950,
            header_bg: color.c900,
            header_fg: tailwind::SLATE.c200,
            row_fg: tailwind::SLATE.c200,
            selected_style_fg: color.c400,
            normal_row_color: tailwind::SLATE.c950,
            alt_row_color: tailwind::SLATE.c900,
            footer_border_color: color.c400,
            bar_color: color.c500,
            alt_bar_color: tailwind::AMBER.c400,
        }
    }
}

struct App {
    state: AppState,
    options: ViewOptions,
    dashboard: Dashboard,
    items: Vec<Data>,
    table_state: TableState,
    longest_item_lens: (u16, u16, u16),
    scroll_state: ScrollbarState,
    colors: TableColors,
    color_index: usize,
    page: usize,
    status: Option<String>,
}

impl App {
    fn new(state: AppState, options: ViewOptions) -> Result<Self, Box<dyn Error>> {
        let dashboard = Dashboard::compute(&state, options.histogram_bins)?;
        let items = data::metric_rows(&dashboard, &options.currency);
        Ok(Self {
            state,
            options,
            dashboard,
            table_state: TableState::default().with_selected(0),
            longest_item_lens: constraint_len_calculator(&items),
            scroll_state: ScrollbarState::new(items.len().saturating_sub(1) * ITEM_HEIGHT),
            colors: TableColors::new(&PALETTES[0]),
            color_index: 0,
            items,
            page: 0,
            status: None,
        })
    }

    /// Recomputes every aggregate for the current range. On failure the
    /// previous snapshot stays on screen.
    fn refresh(&mut self) {
        match Dashboard::compute(&self.state, self.options.histogram_bins) {
            Ok(dashboard) => {
                self.items = data::metric_rows(&dashboard, &self.options.currency);
                self.longest_item_lens = constraint_len_calculator(&self.items);
                self.dashboard = dashboard;
                self.status = None;
            }
            Err(e) => {
                error!("dashboard refresh failed: {}", e);
                self.status = Some(e.to_string());
            }
        }
    }

    fn shift_start(&mut self, step: Step) {
        self.state.shift_start(step);
        self.refresh();
    }

    fn shift_end(&mut self, step: Step) {
        self.state.shift_end(step);
        self.refresh();
    }

    fn reset(&mut self) {
        self.state.reset();
        self.refresh();
    }

    pub fn next(&mut self) {
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
        self.scroll_state = self.scroll_state.position(i * ITEM_HEIGHT);
    }

    pub fn previous(&mut self) {
        let i = match self.table_state.selected() {
            Some(0) | None => self.items.len().saturating_sub(1),
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
        self.scroll_state = self.scroll_state.position(i * ITEM_HEIGHT);
    }

    pub fn next_page(&mut self) {
        self.page = (self.page + 1) % PAGES.len();
    }

    pub fn previous_page(&mut self) {
        self.page = (self.page + PAGES.len() - 1) % PAGES.len();
    }

    pub fn next_color(&mut self) {
        self.color_index = (self.color_index + 1) % PALETTES.len();
        self.colors = TableColors::new(&PALETTES[self.color_index]);
    }
}

pub fn run(state: AppState, options: ViewOptions) -> Result<(), Box<dyn Error>> {
    let app = App::new(state, options)?;

    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, &mut app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            debug!("key {:?}", key.code);
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('j') | KeyCode::Down => app.next(),
                KeyCode::Char('k') | KeyCode::Up => app.previous(),
                KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => app.next_page(),
                KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('[') => app.shift_start(Step::DayBack),
                KeyCode::Char(']') => app.shift_start(Step::DayForward),
                KeyCode::Char('{') => app.shift_start(Step::MonthBack),
                KeyCode::Char('}') => app.shift_start(Step::MonthForward),
                KeyCode::Char('-') => app.shift_end(Step::DayBack),
                KeyCode::Char('=') => app.shift_end(Step::DayForward),
                KeyCode::Char('_') => app.shift_end(Step::MonthBack),
                KeyCode::Char('+') => app.shift_end(Step::MonthForward),
                KeyCode::Char('r') => app.reset(),
                KeyCode::Char('c') => app.next_color(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rects = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(5),
        Constraint::Length(3),
    ])
    .split(f.area());

    render_tabs(f, app, rects[0]);
    match app.page {
        0 => render_overview(f, app, rects[1]),
        1 => render_rfm(f, app, rects[1]),
        2 => render_monthly_trend(f, app, rects[1]),
        3 => render_season_weather(f, app, rects[1]),
        4 => render_yearly_users(f, app, rects[1]),
        5 => render_splits(f, app, rects[1]),
        _ => render_weekday(f, app, rects[1]),
    }
    render_footer(f, app, rects[2]);
}

fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let title = format!(" Bike rental dashboard · {} ", app.state.range());
    let tabs = Tabs::new(PAGES.to_vec())
        .select(app.page)
        .block(Block::bordered().title(title))
        .style(Style::new().fg(app.colors.row_fg).bg(app.colors.buffer_bg))
        .highlight_style(
            Style::new()
                .fg(app.colors.selected_style_fg)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, area);
}

fn render_overview(f: &mut Frame, app: &mut App, area: Rect) {
    let rects = Layout::vertical([Constraint::Length(10), Constraint::Min(5)]).split(area);
    render_table(f, app, rects[0]);
    render_scrollbar(f, app, rects[0]);

    let values: Vec<u64> = app
        .dashboard
        .daily_total
        .iter()
        .map(|d| d.count.max(0) as u64)
        .collect();
    let sparkline = Sparkline::default()
        .block(Block::bordered().title(" Daily rentals (cnt) "))
        .data(&values)
        .style(Style::new().fg(app.colors.bar_color).bg(app.colors.buffer_bg));
    f.render_widget(sparkline, rects[1]);
}

fn render_table(f: &mut Frame, app: &mut App, area: Rect) {
    let header_style = Style::default()
        .fg(app.colors.header_fg)
        .bg(app.colors.header_bg);
    let selected_style = Style::default()
        .add_modifier(Modifier::REVERSED)
        .fg(app.colors.selected_style_fg);

    let header = ["section", "metric", "value"]
        .into_iter()
        .map(Cell::from)
        .collect::<Row>()
        .style(header_style)
        .height(1);
    let rows = app.items.iter().enumerate().map(|(i, data)| {
        let color = match i % 2 {
            0 => app.colors.normal_row_color,
            _ => app.colors.alt_row_color,
        };
        let item = data.ref_array();
        item.into_iter()
            .map(|content| Cell::from(Text::from(content.as_str())))
            .collect::<Row>()
            .style(Style::new().fg(app.colors.row_fg).bg(color))
            .height(ITEM_HEIGHT as u16)
    });
    let bar = " █ ";
    let t = Table::new(
        rows,
        [
            // + 1 is for padding.
            Constraint::Length(app.longest_item_lens.0 + 1),
            Constraint::Min(app.longest_item_lens.1 + 1),
            Constraint::Min(app.longest_item_lens.2),
        ],
    )
    .header(header)
    .highlight_style(selected_style)
    .highlight_symbol(Text::from(bar))
    .bg(app.colors.buffer_bg)
    .highlight_spacing(HighlightSpacing::Always);
    f.render_stateful_widget(t, area, &mut app.table_state);
}

fn constraint_len_calculator(items: &[Data]) -> (u16, u16, u16) {
    let section_len = items
        .iter()
        .map(Data::section)
        .map(UnicodeWidthStr::width)
        .max()
        .unwrap_or(0);
    let metric_len = items
        .iter()
        .map(Data::metric)
        .map(UnicodeWidthStr::width)
        .max()
        .unwrap_or(0);
    let value_len = items
        .iter()
        .map(Data::value)
        .map(UnicodeWidthStr::width)
        .max()
        .unwrap_or(0);

    #[allow(clippy::cast_possible_truncation)]
    (section_len as u16, metric_len as u16, value_len as u16)
}

fn render_scrollbar(f: &mut Frame, app: &mut App, area: Rect) {
    f.render_stateful_widget(
        Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(None)
            .end_symbol(None),
        area.inner(Margin {
            vertical: 1,
            horizontal: 1,
        }),
        &mut app.scroll_state,
    );
}

fn histogram_chart<'a>(title: &'a str, bins: &[Bin], color: Color) -> BarChart<'a> {
    let bars: Vec<Bar> = bins
        .iter()
        .map(|b| {
            Bar::default()
                .value(b.count as u64)
                .label(Line::from(compact(b.lower)))
                .style(Style::new().fg(color))
        })
        .collect();
    BarChart::default()
        .block(Block::bordered().title(title))
        .data(BarGroup::default().bars(&bars))
        .bar_width(3)
        .bar_gap(1)
}

fn render_rfm(f: &mut Frame, app: &mut App, area: Rect) {
    let rects = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(area);
    let dash = &app.dashboard;
    let charts = [
        (" Recency (days) ", &dash.recency_histogram),
        (" Frequency ", &dash.frequency_histogram),
        (" Monetary value ", &dash.monetary_histogram),
    ];
    for (rect, (title, bins)) in rects.iter().zip(charts) {
        f.render_widget(histogram_chart(title, bins, app.colors.bar_color), *rect);
    }
}

fn render_monthly_trend(f: &mut Frame, app: &mut App, area: Rect) {
    let trend = &app.dashboard.monthly_trend;
    let mut years: Vec<i64> = trend.iter().map(|r| r.year).collect();
    years.dedup();
    let series: Vec<(String, Vec<(f64, f64)>)> = years
        .iter()
        .map(|year| {
            let points = trend
                .iter()
                .filter(|r| r.year == *year)
                .map(|r| (r.month.number() as f64, r.count as f64))
                .collect();
            (year_label(*year), points)
        })
        .collect();
    let max = trend.iter().map(|r| r.count).max().unwrap_or(0).max(1) as f64;

    let datasets = series
        .iter()
        .enumerate()
        .map(|(i, (name, points))| {
            let color = if i % 2 == 0 {
                app.colors.bar_color
            } else {
                app.colors.alt_bar_color
            };
            Dataset::default()
                .name(name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::new().fg(color))
                .data(points)
        })
        .collect();
    let month_labels: Vec<Span> = Month::ALL.iter().map(|m| Span::raw(m.abbrev())).collect();
    let chart = Chart::new(datasets)
        .block(Block::bordered().title(" Monthly rentals by year "))
        .x_axis(Axis::default().bounds([1.0, 12.0]).labels(month_labels))
        .y_axis(Axis::default().bounds([0.0, max]).labels(vec![
            Span::raw("0"),
            Span::raw(compact(max / 2.0)),
            Span::raw(compact(max)),
        ]));
    f.render_widget(chart, area);
}

fn render_season_weather(f: &mut Frame, app: &mut App, area: Rect) {
    let rows = &app.dashboard.season_weather;
    let mut seasons: Vec<&str> = rows.iter().map(|r| r.season.as_str()).collect();
    seasons.dedup();
    let groups: Vec<(String, Vec<Bar>)> = seasons
        .iter()
        .map(|season| {
            let bars = rows
                .iter()
                .filter(|r| r.season == *season)
                .enumerate()
                .map(|(i, r)| {
                    Bar::default()
                        .value(r.mean.round().max(0.0) as u64)
                        .label(Line::from(r.weather.clone()))
                        .style(Style::new().fg(if i % 2 == 0 {
                            app.colors.bar_color
                        } else {
                            app.colors.alt_bar_color
                        }))
                })
                .collect();
            (season.to_string(), bars)
        })
        .collect();

    let mut chart = BarChart::default()
        .block(Block::bordered().title(" Mean rentals by season and weather "))
        .bar_width(8)
        .bar_gap(1)
        .group_gap(3);
    for (season, bars) in &groups {
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(season.clone()))
                .bars(bars),
        );
    }
    f.render_widget(chart, area);
}

fn render_yearly_users(f: &mut Frame, app: &mut App, area: Rect) {
    let groups: Vec<(String, [Bar; 2])> = app
        .dashboard
        .yearly_users
        .iter()
        .map(|r| {
            (
                year_label(r.year),
                [
                    Bar::default()
                        .value(r.casual.round().max(0.0) as u64)
                        .label(Line::from("casual"))
                        .style(Style::new().fg(app.colors.alt_bar_color)),
                    Bar::default()
                        .value(r.registered.round().max(0.0) as u64)
                        .label(Line::from("registered"))
                        .style(Style::new().fg(app.colors.bar_color)),
                ],
            )
        })
        .collect();

    let mut chart = BarChart::default()
        .block(Block::bordered().title(" Average daily users by year "))
        .bar_width(10)
        .bar_gap(1)
        .group_gap(4);
    for (year, bars) in &groups {
        chart = chart.data(BarGroup::default().label(Line::from(year.clone())).bars(bars));
    }
    f.render_widget(chart, area);
}

fn share_chart<'a>(title: &'a str, shares: &[Share], color: Color) -> BarChart<'a> {
    let bars: Vec<Bar> = shares
        .iter()
        .map(|s| {
            Bar::default()
                .value(s.percent.round() as u64)
                .text_value(format!("{:.1}%", s.percent))
                .label(Line::from(s.label.clone()))
                .style(Style::new().fg(color))
        })
        .collect();
    BarChart::default()
        .block(Block::bordered().title(title))
        .data(BarGroup::default().bars(&bars))
        .max(100)
        .bar_width(9)
        .bar_gap(2)
}

fn render_splits(f: &mut Frame, app: &mut App, area: Rect) {
    let rects = Layout::horizontal([Constraint::Ratio(1, 2); 2]).split(area);
    let dash = &app.dashboard;
    f.render_widget(
        share_chart(" Rentals by holiday ", &dash.holiday_shares, app.colors.bar_color),
        rects[0],
    );
    f.render_widget(
        share_chart(
            " Rentals by working day ",
            &dash.working_day_shares,
            app.colors.alt_bar_color,
        ),
        rects[1],
    );
}

fn render_weekday(f: &mut Frame, app: &mut App, area: Rect) {
    let bars: Vec<Bar> = app
        .dashboard
        .weekday_means
        .iter()
        .map(|w| {
            Bar::default()
                .value(w.mean.round().max(0.0) as u64)
                .label(Line::from(w.label.clone()))
                .style(Style::new().fg(app.colors.bar_color))
        })
        .collect();
    let chart = BarChart::default()
        .block(Block::bordered().title(" Mean rentals by weekday "))
        .data(BarGroup::default().bars(&bars))
        .bar_width(7)
        .bar_gap(2);
    f.render_widget(chart, area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let (text, fg) = match &app.status {
        Some(status) => (status.as_str(), tailwind::RED.c400),
        None => (INFO_TEXT, app.colors.row_fg),
    };
    let info_footer = Paragraph::new(Line::from(text))
        .style(Style::new().fg(fg).bg(app.colors.buffer_bg))
        .centered()
        .block(
            Block::bordered()
                .border_type(BorderType::Double)
                .border_style(Style::new().fg(app.colors.footer_border_color)),
        );
    f.render_widget(info_footer, area);
}

/// `yr` is coded 0/1 for 2011/2012 in the source data.
fn year_label(year: i64) -> String {
    match year {
        0 | 1 => (2011 + year).to_string(),
        _ => year.to_string(),
    }
}

fn compact(value: f64) -> String {
    match value.abs() {
        v if v >= 1_000_000.0 => format!("{:.1}M", value / 1_000_000.0),
        v if v >= 1_000.0 => format!("{:.0}k", value / 1_000.0),
        _ => format!("{:.0}", value),
    }
}

#[cfg(test)]
mod tests {
    use crate::data::Data;

    fn row(section: &str, metric: &str, value: &str) -> Data {
        Data {
            section: section.to_string(),
            metric: metric.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn constraint_len_calculator() {
        let test_data = vec![
            row("Daily rentals", "Casual users", "150"),
            row("RFM (instant / record index)", "Average monetary", "AUD\u{a0}75.000,00"),
        ];
        let (longest_section_len, longest_metric_len, longest_value_len) =
            super::constraint_len_calculator(&test_data);

        assert_eq!(28, longest_section_len);
        assert_eq!(16, longest_metric_len);
        assert_eq!(13, longest_value_len);
    }

    #[test]
    fn year_labels_decode_year_flag() {
        assert_eq!(super::year_label(0), "2011");
        assert_eq!(super::year_label(1), "2012");
        assert_eq!(super::year_label(2019), "2019");
    }

    #[test]
    fn compact_axis_labels() {
        assert_eq!(super::compact(950.0), "950");
        assert_eq!(super::compact(12_345.0), "12k");
        assert_eq!(super::compact(2_500_000.0), "2.5M");
    }
}
