//! TUI rendering for basket-tui
//!
//! This module handles all UI rendering logic using the `ratatui` crate:
//! the catalog browser, the basket/location screen, comparison results, the
//! settings display, and the blocking notification popup.

use crate::app::{App, ViewMode};
use crate::compare::{lowest_price, lowest_price_platform, ComparisonResult};
use crate::models::{or_unknown, platform, Amount, Platform, Product, PLATFORMS};
use ratatui::{prelude::*, widgets::*};

const SELECTED: Style = Style::new()
    .fg(Color::Cyan)
    .bg(Color::Rgb(30, 30, 60))
    .add_modifier(Modifier::BOLD);

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Renders one frame of the TUI based on current application state.
///
/// Draws the view tab bar, the active view, and the help/status footer. A
/// pending notification is drawn last, on top of everything else.
///
/// # Arguments
///
/// * `f` - The ratatui frame to draw into (from `terminal.draw()`).
/// * `app` - Current application state.
pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.size());

    render_tabs(f, app, chunks[0]);

    match app.view_mode {
        ViewMode::Catalog => render_catalog_view(f, app, chunks[1]),
        ViewMode::Compare => render_compare_view(f, app, chunks[1]),
        ViewMode::Results => render_results_view(f, app, chunks[1]),
        ViewMode::Settings => render_settings_view(f, app, chunks[1]),
    }

    render_footer(f, app, chunks[2]);

    if app.notification.is_some() {
        render_notification(f, app);
    }
}

fn rupees(amount: Amount) -> String {
    format!("₹{}", amount.normalize())
}

fn platform_color(p: &Platform) -> Color {
    let (r, g, b) = p.color;
    Color::Rgb(r, g, b)
}

fn spinner(app: &App) -> &'static str {
    SPINNER[app.tick_count % SPINNER.len()]
}

fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<String> = ViewMode::ALL
        .iter()
        .enumerate()
        .map(|(i, v)| format!("{} {}", i + 1, v.title()))
        .collect();
    let selected = ViewMode::ALL
        .iter()
        .position(|v| *v == app.view_mode)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let help = match app.view_mode {
        ViewMode::Catalog => " ↑/↓ select  Enter add  l locate  r compare  q quit",
        ViewMode::Compare => " ↑/↓ select  d remove  c clear  l locate  r compare  q quit",
        ViewMode::Results => " ←/→ platform  o open search  r compare again  t cart  q quit",
        ViewMode::Settings => " edit config.toml and restart to change settings  q quit",
    };
    let line = match app.status_message {
        Some(ref msg) => Line::from(vec![
            Span::styled(format!(" {msg} "), Style::default().fg(Color::Yellow)),
            Span::styled("│", Style::default().fg(Color::DarkGray)),
            Span::styled(help, Style::default().fg(Color::DarkGray)),
        ]),
        None => Line::from(Span::styled(help, Style::default().fg(Color::DarkGray))),
    };
    f.render_widget(Paragraph::new(line), area);
}

/// Catalog view: product list (45%) + details for the selected product (55%).
fn render_catalog_view(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let items: Vec<ListItem> = app
        .catalog
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let style = if i == app.catalog_index {
                SELECTED
            } else {
                Style::default()
            };
            let marker = if app.is_in_basket(p) { "✓" } else { " " };
            let from = lowest_price(&p.prices).map(rupees).unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {marker} {}", p.name), style),
                Span::styled(format!("  {from}"), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(format!(" Products ({}) ", app.catalog.len()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(list, chunks[0]);

    let Some(product) = app.catalog.get(app.catalog_index) else {
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            product.name.as_str(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("Category: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(product.category.as_str()),
            Span::raw("  │  "),
            Span::styled("Rating: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("{}★", product.rating)),
        ]),
        Line::from(""),
    ];
    let lowest = lowest_price_platform(&product.prices);
    for p in &PLATFORMS {
        let mut spans = vec![Span::styled(
            format!("{:<10}", p.name),
            Style::default().fg(platform_color(p)),
        )];
        if product.is_available_on(p.id) {
            let is_lowest = lowest == Some(p.id);
            spans.push(Span::styled(
                format!("{:>8}", rupees(product.price_on(p.id))),
                if is_lowest {
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                },
            ));
            spans.push(Span::styled(
                format!("  {}", product.delivery_time_on(p.id)),
                Style::default().fg(Color::DarkGray),
            ));
            if is_lowest {
                spans.push(Span::styled(" Lowest", Style::default().fg(Color::Green)));
            }
        } else {
            spans.push(Span::styled(
                format!("{:>8}", "Out of Stock"),
                Style::default().fg(Color::Red),
            ));
        }
        lines.push(Line::from(spans));
    }

    let p = Paragraph::new(lines).block(
        Block::default()
            .title(" Product Details ")
            .borders(Borders::ALL)
            .padding(Padding::new(2, 2, 1, 1)),
    );
    f.render_widget(p, chunks[1]);
}

/// Compare view: selected products (65%) + location and compare status (35%).
fn render_compare_view(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let basket = app.basket();
    let items: Vec<ListItem> = if basket.is_empty() {
        vec![
            ListItem::new(Line::from(Span::styled(
                " No products selected for comparison",
                Style::default().add_modifier(Modifier::BOLD),
            ))),
            ListItem::new(Line::from(Span::styled(
                " Add items from the Catalog (1) to start comparing prices across platforms.",
                Style::default().fg(Color::DarkGray),
            ))),
        ]
    } else {
        basket
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let style = if i == app.basket_index {
                    SELECTED
                } else {
                    Style::default()
                };
                let from = lowest_price(&p.prices)
                    .map(|a| format!("From {}", rupees(a)))
                    .unwrap_or_default();
                ListItem::new(Line::from(vec![
                    Span::styled(format!(" {:<40}", p.name), style),
                    Span::styled(from, Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .title(format!(" Selected Products ({}) ", basket.len()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(list, chunks[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .split(chunks[1]);

    let location_lines = if app.is_detecting {
        vec![Line::from(Span::styled(
            format!(" {} Detecting...", spinner(app)),
            Style::default().fg(Color::Yellow),
        ))]
    } else if let Some(ref loc) = app.detected_location {
        let row = |label: &'static str, value: &str| {
            Line::from(vec![
                Span::styled(label, Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(or_unknown(value).to_string(), Style::default().fg(Color::Green)),
            ])
        };
        vec![
            Line::from(Span::styled("Detected:", Style::default().fg(Color::Green))),
            row("City:     ", &loc.city),
            row("Area:     ", &loc.area),
            row("Landmark: ", &loc.landmark),
            row("Pincode:  ", &loc.pincode),
        ]
    } else {
        vec![Line::from(Span::styled(
            " Press l to detect my location",
            Style::default().fg(Color::DarkGray),
        ))]
    };

    f.render_widget(
        Paragraph::new(location_lines).block(
            Block::default()
                .title(" Location ")
                .borders(Borders::ALL)
                .padding(Padding::horizontal(1)),
        ),
        side[0],
    );

    let ready = !basket.is_empty() && app.detected_location.is_some();
    let status = if app.is_comparing {
        Line::from(Span::styled(
            format!(" {} Comparing...", spinner(app)),
            Style::default().fg(Color::Yellow),
        ))
    } else if ready {
        Line::from(Span::styled(
            " Press r to compare basket",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
    } else {
        Line::from(Span::styled(
            " Select products and detect your location to compare",
            Style::default().fg(Color::DarkGray),
        ))
    };
    let mut status_lines = vec![status];
    if app.comparison.is_some() {
        status_lines.push(Line::from(""));
        status_lines.push(Line::from(" Press t to add to cart, 3 to view results"));
    }
    if !app.cart().items().is_empty() {
        status_lines.push(Line::from(Span::styled(
            format!(" Cart: {} items", app.cart().items().len()),
            Style::default().fg(Color::Green),
        )));
    }
    f.render_widget(
        Paragraph::new(status_lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().title(" Compare ").borders(Borders::ALL)),
        side[1],
    );
}

/// Results view: one card per platform on top, product-wise table below.
fn render_results_view(f: &mut Frame, app: &App, area: Rect) {
    let Some(ref result) = app.comparison else {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from("No comparison yet."),
            Line::from(Span::styled(
                "Add products, detect your location, then press r.",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(msg, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .split(area);

    render_platform_cards(f, app, result, chunks[0]);
    render_product_table(f, result, chunks[1]);
}

fn render_platform_cards(f: &mut Frame, app: &App, result: &ComparisonResult, area: Rect) {
    let when = app
        .last_compared
        .map(|t| format!(" at {}", t.format("%H:%M:%S")))
        .unwrap_or_default();
    let title = format!(" Basket Comparison - {}{} ", result.location, when);
    let outer = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let banner = match result.cheapest_platform {
        Some(id) => Line::from(vec![
            Span::raw(" Cheapest: "),
            Span::styled(
                platform(id).name,
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
        ]),
        None => Line::from(Span::styled(
            " No platform can fulfil the whole basket",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
    };
    f.render_widget(Paragraph::new(banner), rows[0]);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, PLATFORMS.len() as u32); PLATFORMS.len()])
        .split(rows[1]);

    for (i, (p, slot)) in PLATFORMS.iter().zip(cards.iter()).enumerate() {
        let Some(data) = result.total_for(p.id) else {
            continue;
        };
        let full = data.is_fully_available();
        let is_cheapest = result.cheapest_platform == Some(p.id);

        let mut lines = vec![
            Line::from(vec![
                Span::styled("Total: ", Style::default().fg(Color::DarkGray)),
                Span::styled(rupees(data.total), Style::default().add_modifier(Modifier::BOLD)),
            ]),
            Line::from(vec![
                Span::styled("Available: ", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{}/{}", data.available_count, data.total_products),
                    Style::default().fg(if full { Color::Green } else { Color::Red }),
                ),
            ]),
        ];
        if data.savings > Amount::ZERO {
            lines.push(Line::from(Span::styled(
                format!("+{} vs cheapest", rupees(data.savings)),
                Style::default().fg(Color::Red),
            )));
        }
        if is_cheapest {
            lines.push(Line::from(Span::styled(
                "Cheapest",
                Style::default().fg(Color::Black).bg(Color::Green),
            )));
        }

        let border = if i == app.platform_index {
            Style::default().fg(Color::Cyan)
        } else if is_cheapest {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let card = Paragraph::new(lines).block(
            Block::default()
                .title(Span::styled(
                    format!(" ● {} ", p.name),
                    Style::default().fg(platform_color(p)),
                ))
                .borders(Borders::ALL)
                .border_style(border),
        );
        f.render_widget(card, *slot);
    }
}

fn product_cell(product: &Product, p: &Platform, is_lowest: bool) -> Cell<'static> {
    if !product.is_available_on(p.id) {
        return Cell::from(Text::from(vec![Line::from(Span::styled(
            "Out of Stock ✗",
            Style::default().fg(Color::Red),
        ))]));
    }
    let mut price = vec![Span::styled(
        rupees(product.price_on(p.id)),
        if is_lowest {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        },
    )];
    if is_lowest {
        price.push(Span::styled(
            " Lowest",
            Style::default().fg(Color::Black).bg(Color::Green),
        ));
    }
    Cell::from(Text::from(vec![
        Line::from(price),
        Line::from(Span::styled(
            format!("⏱ {} ✓", product.delivery_time_on(p.id)),
            Style::default().fg(Color::DarkGray),
        )),
    ]))
}

fn render_product_table(f: &mut Frame, result: &ComparisonResult, area: Rect) {
    let header = Row::new(
        std::iter::once(Cell::from("Product")).chain(PLATFORMS.iter().map(|p| {
            Cell::from(Span::styled(
                format!("● {}", p.name),
                Style::default().fg(platform_color(p)),
            ))
        })),
    )
    .style(Style::default().add_modifier(Modifier::BOLD))
    .bottom_margin(1);

    let rows: Vec<Row> = result
        .products
        .iter()
        .enumerate()
        .map(|(i, product)| {
            let lowest = lowest_price_platform(&product.prices);
            let name = Cell::from(Text::from(vec![
                Line::from(product.name.clone()),
                Line::from(Span::styled(
                    format!("Rating: {}★", product.rating),
                    Style::default().fg(Color::DarkGray),
                )),
            ]));
            let cells = std::iter::once(name).chain(
                PLATFORMS
                    .iter()
                    .map(|p| product_cell(product, p, lowest == Some(p.id))),
            );
            let style = if i % 2 == 0 {
                Style::default().bg(Color::Rgb(20, 20, 28))
            } else {
                Style::default()
            };
            Row::new(cells).height(2).style(style)
        })
        .collect();

    let widths = std::iter::once(Constraint::Percentage(32))
        .chain(std::iter::repeat(Constraint::Percentage(17)).take(PLATFORMS.len()));

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(" Product-wise Comparison ")
            .borders(Borders::ALL),
    );
    f.render_widget(table, area);
}

/// Settings view: read-only display of the loaded configuration.
fn render_settings_view(f: &mut Frame, app: &App, area: Rect) {
    let c = &app.config;
    let rows: [(&str, String); 11] = [
        ("Coordinate source      ", format!("{:?}", c.location.source)),
        ("Manual latitude        ", format!("{:.4}", c.location.manual_lat)),
        ("Manual longitude       ", format!("{:.4}", c.location.manual_lon)),
        (
            "High accuracy          ",
            if c.location.high_accuracy { "Yes" } else { "No" }.to_string(),
        ),
        ("Position timeout (s)   ", c.location.timeout_seconds.to_string()),
        ("Position max age (s)   ", c.location.maximum_age_seconds.to_string()),
        ("Geocode service        ", c.geocode.base_url.clone()),
        ("Geocode timeout (s)    ", c.geocode.timeout_seconds.to_string()),
        ("Compare delay (ms)     ", c.compare.delay_ms.to_string()),
        (
            "Catalog file           ",
            c.catalog.path.clone().unwrap_or_else(|| "bundled".to_string()),
        ),
        ("Default view           ", c.ui.default_view.clone()),
    ];
    let items: Vec<Line> = rows
        .iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(
                    format!("  {} ", label),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(value.as_str()),
            ])
        })
        .collect();

    let block = Block::default()
        .title(" config.toml ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    f.render_widget(Paragraph::new(items).block(block), area);
}

fn render_notification(f: &mut Frame, app: &App) {
    let Some(ref note) = app.notification else {
        return;
    };
    let area = centered_rect(50, 20, f.size());
    let body = Paragraph::new(vec![
        Line::from(""),
        Line::from(note.message.as_str()),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to continue",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .title(format!(" {} ", note.title))
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(Clear, area);
    f.render_widget(body, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
