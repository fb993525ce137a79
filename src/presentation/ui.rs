use crate::application::{App, AppMode, AuthForm, DealForm, Route, RouteDecision};
use crate::domain::{AuthField, CategoryFilter, Deal, DealField};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

pub const EMPTY_RESULTS: &str = "No deals found matching your search criteria.";

pub fn render_ui(f: &mut Frame, app: &App) {
    let snapshot = app.snapshot();
    let banner = snapshot.needs_email_verification();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(u16::from(banner)),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    if banner {
        render_verification_banner(f, chunks[1]);
    }

    // The gate is re-evaluated on every frame; a revoked session never
    // draws the dashboard even before the next tick adjusts the route.
    match app.current_view() {
        RouteDecision::Render(Route::Admin) => render_admin(f, app, chunks[2].union(chunks[3])),
        _ => {
            render_category_bar(f, app, chunks[2]);
            render_catalog(f, app, chunks[3]);
        }
    }
    render_status_bar(f, app, chunks[4]);

    match app.mode {
        AppMode::Auth => {
            if let Some(form) = &app.auth_form {
                render_auth_popup(f, form, snapshot.is_loading);
            }
        }
        AppMode::DealForm => {
            if let Some(form) = &app.deal_form {
                render_deal_form_popup(f, form);
            }
        }
        AppMode::Help => render_help_popup(f, app.help_scroll),
        _ => {}
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let snapshot = app.snapshot();
    let account = match snapshot.identity() {
        Some(identity) if identity.is_admin => format!("{} (admin)", identity.name),
        Some(identity) => identity.name.clone(),
        None if snapshot.is_loading => "Signing in...".to_string(),
        None => "Guest".to_string(),
    };
    let search = if app.criteria.search_query.is_empty() {
        "Search for deals...".to_string()
    } else {
        app.criteria.search_query.clone()
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled("DealSpot", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(" | Search: "),
        Span::styled(
            search,
            if app.mode == AppMode::Search {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            },
        ),
        Span::raw(" | "),
        Span::styled(account, Style::default().fg(Color::Yellow)),
    ]));
    f.render_widget(header, area);
}

fn render_verification_banner(f: &mut Frame, area: Rect) {
    let banner = Paragraph::new(
        "Please verify your email address. Check your inbox for the verification link. (v: resend)",
    )
    .style(Style::default().bg(Color::Yellow).fg(Color::Black));
    f.render_widget(banner, area);
}

fn render_category_bar(f: &mut Frame, app: &App, area: Rect) {
    let options = CategoryFilter::options();
    let selected = options
        .iter()
        .position(|option| *option == app.criteria.selected_category)
        .unwrap_or(0);
    let tabs = Tabs::new(options.iter().map(|option| option.label()))
        .select(selected)
        .block(Block::default().borders(Borders::ALL).title("Categories"))
        .highlight_style(Style::default().bg(Color::LightBlue).fg(Color::Black));
    f.render_widget(tabs, area);
}

fn render_catalog(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Deals ({})", app.visible.len()));

    if app.visible.is_empty() {
        let empty = Paragraph::new(EMPTY_RESULTS)
            .style(Style::default().fg(Color::Gray))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(area);

    let visible_rows = columns[0].height.saturating_sub(3) as usize;
    let offset = (app.selected + 1).saturating_sub(visible_rows);

    let header = Row::new(["Deal", "Price", "Off", "Sold", "Ends"])
        .style(Style::default().fg(Color::Yellow));
    let rows = app
        .visible
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible_rows)
        .map(|(index, deal)| {
            let style = if index == app.selected {
                Style::default().bg(Color::Blue).fg(Color::White)
            } else if deal.is_expired(app.today) {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(deal.title.clone()),
                Cell::from(format!("${:.2}", deal.discounted_price)),
                Cell::from(format!("{}%", deal.discount_percentage)),
                Cell::from(deal.sold_count.to_string()),
                Cell::from(end_label(deal, app)),
            ])
            .style(style)
        });

    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(9),
            Constraint::Length(4),
            Constraint::Length(5),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(block)
    .column_spacing(1);
    f.render_widget(table, columns[0]);

    if let Some(deal) = app.selected_deal() {
        render_deal_details(f, deal, app, columns[1]);
    }
}

fn end_label(deal: &Deal, app: &App) -> String {
    if deal.is_expired(app.today) {
        "Expired".to_string()
    } else {
        deal.end_date.format("%b %-d").to_string()
    }
}

fn render_deal_details(f: &mut Frame, deal: &Deal, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(
            deal.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("{} | {}", deal.category, deal.location)),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                format!("${:.2}", deal.discounted_price),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(
                format!("${:.2}", deal.original_price),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT),
            ),
            Span::styled(
                format!("  {}% OFF", deal.discount_percentage),
                Style::default().fg(Color::Red),
            ),
        ]),
        Line::from(format!("{} sold", deal.sold_count)),
    ];
    if deal.is_expired(app.today) {
        lines.push(Line::from(Span::styled(
            format!("Expired {}", deal.end_date),
            Style::default().fg(Color::Red),
        )));
    } else {
        lines.push(Line::from(format!("Ends {}", deal.end_date)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(deal.description.clone()));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        deal.image_url.clone(),
        Style::default().fg(Color::DarkGray),
    )));

    let details = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Details"));
    f.render_widget(details, area);
}

fn render_admin(f: &mut Frame, app: &App, area: Rect) {
    let deals = app.catalog.deals();
    let visible_rows = area.height.saturating_sub(3) as usize;
    let offset = (app.admin_selected + 1).saturating_sub(visible_rows);

    let header = Row::new(["Title", "Category", "Price", "Sold", "Status"])
        .style(Style::default().fg(Color::Yellow));
    let rows = deals
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible_rows)
        .map(|(index, deal)| {
            let expired = deal.is_expired(app.today);
            let status = Cell::from(if expired { "Expired" } else { "Active" }).style(
                Style::default().fg(if expired { Color::Red } else { Color::Green }),
            );
            let row = Row::new(vec![
                Cell::from(deal.title.clone()),
                Cell::from(deal.category.label()),
                Cell::from(format!("${:.2} / ${:.2}", deal.discounted_price, deal.original_price)),
                Cell::from(deal.sold_count.to_string()),
                status,
            ]);
            if index == app.admin_selected {
                row.style(Style::default().bg(Color::Blue).fg(Color::White))
            } else {
                row
            }
        });

    let table = Table::new(
        rows,
        [
            Constraint::Min(24),
            Constraint::Length(14),
            Constraint::Length(19),
            Constraint::Length(5),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Admin Dashboard - Manage Deals ({})", deals.len())),
    )
    .column_spacing(1);
    f.render_widget(table, area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let snapshot = app.snapshot();
    let input_text = match app.mode {
        AppMode::Browse | AppMode::Admin if app.status_message.is_some() => {
            app.status_message.clone().unwrap_or_default()
        }
        AppMode::Browse => {
            let account = if snapshot.is_authenticated() {
                "o: sign out"
            } else {
                "i: sign in | s: sign up"
            };
            format!(
                "←→: category | ↑↓: select | /: search | a: admin | {account} | ?: help | q: quit"
            )
        }
        AppMode::Search => "Type to filter (Enter to keep, Esc to clear)".to_string(),
        AppMode::Auth => {
            "Tab: next field | Enter: submit | Ctrl+T: switch sign in/sign up | Esc: cancel"
                .to_string()
        }
        AppMode::Admin => {
            "n: new deal | Enter/e: edit | d: delete | b/Esc: storefront | o: sign out | q: quit"
                .to_string()
        }
        AppMode::DealForm => {
            "Tab: next field | ←→: category | Enter: save | Esc: cancel".to_string()
        }
        AppMode::Help => {
            "↑↓/jk: scroll | PgUp/PgDn: fast scroll | Home: top | Esc/q: close help".to_string()
        }
    };

    let input = Paragraph::new(input_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(match app.mode {
            AppMode::Browse => Style::default(),
            AppMode::Search => Style::default().fg(Color::Green),
            AppMode::Auth => Style::default().fg(Color::Yellow),
            AppMode::Admin => Style::default().fg(Color::Magenta),
            AppMode::DealForm => Style::default().fg(Color::Yellow),
            AppMode::Help => Style::default().fg(Color::Cyan),
        });
    f.render_widget(input, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(format!("{label:>16}: "), Style::default().fg(Color::Yellow)),
        Span::styled(value.to_string(), style),
        Span::styled(if focused { "_" } else { "" }.to_string(), style),
    ])
}

fn render_auth_popup(f: &mut Frame, form: &AuthForm, loading: bool) {
    let popup_area = centered(f.area(), 64, form.fields().len() as u16 * 2 + 5);
    f.render_widget(Clear, popup_area);

    let mut lines = Vec::new();
    for field in form.fields().iter().copied() {
        let value = match field {
            AuthField::Password | AuthField::ConfirmPassword => {
                "*".repeat(form.value(field).chars().count())
            }
            AuthField::Name | AuthField::Email => form.value(field).to_string(),
        };
        lines.push(field_line(field.label(), &value, form.focus == field));
        let error = form.errors.as_ref().and_then(|errors| errors.for_field(field));
        lines.push(match error {
            Some(message) => Line::from(Span::styled(
                format!("{:>18}{message}", ""),
                Style::default().fg(Color::Red),
            )),
            None => Line::from(""),
        });
    }
    lines.push(Line::from(""));
    if loading {
        lines.push(Line::from(Span::styled(
            "Please wait...",
            Style::default().fg(Color::Cyan),
        )));
    } else if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))));
    }

    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(form.title())
            .style(Style::default().fg(Color::White)),
    );
    f.render_widget(popup, popup_area);
}

fn render_deal_form_popup(f: &mut Frame, form: &DealForm) {
    let popup_area = centered(f.area(), 72, DealField::ALL.len() as u16 * 2 + 4);
    f.render_widget(Clear, popup_area);

    let focused = form.focused_field();
    let mut lines = Vec::new();
    for field in DealField::ALL {
        lines.push(field_line(field.label(), form.fields.get(field), field == focused));
        let error = form.errors.as_ref().and_then(|errors| errors.for_field(field));
        lines.push(match error {
            Some(message) => Line::from(Span::styled(
                format!("{:>18}{message}", ""),
                Style::default().fg(Color::Red),
            )),
            None => Line::from(""),
        });
    }
    lines.push(Line::from(Span::styled(
        format!("Enter: {}", form.submit_label()),
        Style::default().fg(Color::Green),
    )));

    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(form.title())
            .style(Style::default().fg(Color::White)),
    );
    f.render_widget(popup, popup_area);
}

fn render_help_popup(f: &mut Frame, scroll: usize) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);

    let help_lines: Vec<&str> = HELP_TEXT.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;

    let start_line = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(help_lines.len());

    let visible_text = help_lines[start_line..end_line].join("\n");

    let help_widget = Paragraph::new(visible_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("DealSpot Help (Line {}/{})", start_line + 1, help_lines.len()))
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(help_widget, popup_area);
}

const HELP_TEXT: &str = r#"DEALSPOT STOREFRONT

=== BROWSING ===
↑↓ or j/k       Move between deals
←→ or h/l       Previous/next category (Tab also works)
/               Search titles, descriptions and locations
Esc             Clear the current search
                Search is case-insensitive and combines with the category

=== ACCOUNT ===
i               Sign in
s               Create an account
o               Sign out
v               Resend the verification email
                New accounts must verify their email address

Demo accounts:
  admin@dealspot.com     / admin123   (administrator)
  john.doe@dealspot.com  / john123    (shopper)

=== SIGN IN DIALOG ===
Tab / ↑↓        Move between fields
Enter           Submit
Ctrl+T          Switch between sign in and sign up
Esc             Cancel

=== ADMIN DASHBOARD ===
a               Open the dashboard (administrators only)
n               Create a new deal
Enter or e      Edit the selected deal
d or Delete     Delete the selected deal
b or Esc        Back to the storefront

=== DEAL FORM ===
Tab / ↑↓        Move between fields
←→              Choose a category (on the Category field)
Enter           Save the deal
Esc             Cancel
                Prices must be positive numbers
                End date uses YYYY-MM-DD
                The discount percentage is calculated from the prices

=== HELP NAVIGATION ===
↑↓ or j/k       Scroll help text up/down one line
Page Up/Down    Scroll help text up/down 5 lines
Home            Jump to top of help text
Esc/F1/?/q      Close this help window"#;
