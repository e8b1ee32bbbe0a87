//! # Main Display Module
//!
//! This module contains the main display components and layout logic
//! for the Melody Generator application.

use iced::widget::{
    Space, button, center, column, container, horizontal_space, mouse_area, opaque, progress_bar,
    row, stack, text, text_input,
};
use iced::{Alignment, Color, Element, Length};

use super::note_strip::NoteStrip;
use crate::{AppDisplayData, Message, Playback, Popup};

/// Width of the label column in the settings grid.
const LABEL_WIDTH: f32 = 240.0;

/// One labelled text field of the melody settings grid.
struct FieldConfig<'a> {
    label: &'static str,
    value: &'a str,
    on_input: fn(String) -> Message,
}

/// Creates the complete main application view
pub fn create_main_view(data: &AppDisplayData) -> Element<'_, Message> {
    let title = text("Melody Generator").size(28);

    let content = column![
        title,
        Space::with_height(10),
        create_connection_panel(data),
        create_settings_panel(data),
        create_playback_panel(data),
    ]
    .spacing(15)
    .padding(20)
    .width(Length::Fill);

    let base = container(content).width(Length::Fill).height(Length::Fill);

    match data.popups.front() {
        Some(popup) => modal(base.into(), popup),
        None => base.into(),
    }
}

/// Address field, connect/disconnect buttons and connection status.
fn create_connection_panel(data: &AppDisplayData) -> Element<'_, Message> {
    let address_input = text_input("Bluetooth serial address (e.g. COM5)", &data.address)
        .on_input(Message::AddressChanged)
        .on_submit(Message::Connect)
        .padding(8)
        .width(Length::Fill);

    let status = match &data.connected_to {
        Some(address) => text(format!("Connected to {address}")).color(Color::from_rgb8(0x34, 0xDB, 0x98)),
        None => text("Not connected").color(Color::from_rgb(0.6, 0.6, 0.6)),
    };

    column![
        row![
            address_input,
            button("Connect").on_press(Message::Connect).padding([8, 14]),
            button("Disconnect").on_press(Message::Disconnect).padding([8, 14]),
            button("Find HC-06").on_press(Message::FindHc06).padding([8, 14]),
        ]
        .spacing(10)
        .align_y(Alignment::Center),
        status.size(14),
    ]
    .spacing(8)
    .into()
}

/// The melody form plus the generate and pause buttons.
fn create_settings_panel(data: &AppDisplayData) -> Element<'_, Message> {
    let fields = [
        FieldConfig {
            label: "Length (notes):",
            value: &data.form.length,
            on_input: Message::LengthChanged,
        },
        FieldConfig {
            label: "Tempo (BPM):",
            value: &data.form.tempo,
            on_input: Message::TempoChanged,
        },
        FieldConfig {
            label: "Delay between notes (ms):",
            value: &data.form.delay,
            on_input: Message::DelayChanged,
        },
        FieldConfig {
            label: "Speed factor:",
            value: &data.form.speed_factor,
            on_input: Message::SpeedFactorChanged,
        },
    ];

    let grid = fields
        .into_iter()
        .fold(column![].spacing(10), |col, field| col.push(make_field_row(field)));

    let actions = column![
        make_action_row(
            "Generate melody:",
            button("Generate and send").on_press(Message::GenerateAndSend).padding([8, 14]).into(),
        ),
        make_action_row(
            "Pause/Resume:",
            button("Pause/Resume").on_press(Message::PauseResume).padding([8, 14]).into(),
        ),
        make_action_row(
            "Settings file:",
            row![
                button("Save Settings").on_press(Message::SaveSettings).padding([8, 14]),
                button("Load Settings").on_press(Message::LoadSettings).padding([8, 14]),
            ]
            .spacing(10)
            .into(),
        ),
    ]
    .spacing(10);

    container(column![text("Melody").size(18), grid, actions].spacing(12))
        .width(Length::Fill)
        .into()
}

fn make_field_row(field: FieldConfig<'_>) -> Element<'_, Message> {
    row![
        text(field.label).width(Length::Fixed(LABEL_WIDTH)),
        text_input("", field.value)
            .on_input(field.on_input)
            .padding(6)
            .width(Length::Fixed(160.0)),
    ]
    .spacing(10)
    .align_y(Alignment::Center)
    .into()
}

fn make_action_row<'a>(label: &'static str, control: Element<'a, Message>) -> Element<'a, Message> {
    row![text(label).width(Length::Fixed(LABEL_WIDTH)), control]
        .spacing(10)
        .align_y(Alignment::Center)
        .into()
}

/// Progress bar and note strip for the melody on the link.
fn create_playback_panel(data: &AppDisplayData) -> Element<'static, Message> {
    let (label, sent, total, paused) = match data.playback {
        Playback::Idle => ("Idle".to_string(), 0, 0, false),
        Playback::Playing { sent, total, paused } => {
            let state = if paused { "Paused" } else { "Playing" };
            (format!("{state}: {sent}/{total}"), sent, total, paused)
        }
    };

    let progress = progress_bar(0.0..=total.max(1) as f32, sent as f32).height(Length::Fixed(8.0));

    column![
        row![text("Playback").size(18), horizontal_space(), text(label).size(14)]
            .align_y(Alignment::Center),
        progress,
        NoteStrip::new(data.last_note, paused).view(),
    ]
    .spacing(10)
    .into()
}

/// Lays a dimmed backdrop and a message box over `base`.
///
/// Clicking outside the box dismisses it, as does the OK button.
fn modal<'a>(base: Element<'a, Message>, popup: &'a Popup) -> Element<'a, Message> {
    let dialog = container(
        column![
            text(&popup.title).size(20),
            text(&popup.message).size(14),
            row![
                horizontal_space(),
                button("OK").on_press(Message::DismissPopup).padding([6, 20]),
            ],
        ]
        .spacing(15),
    )
    .width(Length::Fixed(400.0))
    .padding(20)
    .style(container::rounded_box);

    stack![
        base,
        opaque(
            mouse_area(center(opaque(dialog)).style(|_theme| container::Style {
                background: Some(
                    Color {
                        a: 0.7,
                        ..Color::BLACK
                    }
                    .into(),
                ),
                ..container::Style::default()
            }))
            .on_press(Message::DismissPopup)
        )
    ]
    .into()
}
