use softpos_demo_core::{Led, TerminalView};

const WIDTH: usize = 36;

/// Draw the terminal as a block of text
///
/// With `debug` the footer shows the device id and kernel version.
pub fn draw(view: &TerminalView, debug: bool) -> String {
    let mut lines = vec![
        border('┌', '┐'),
        row(&format!("SoftPOS {:>width$}", led(view.led), width = WIDTH - 12)),
        border('├', '┤'),
        row(&view.status_message),
    ];

    if let Some(amount) = &view.amount {
        lines.push(row(&format!("{amount:>width$}", width = WIDTH - 4)));
    }

    if let Some(amount) = &view.approved_amount {
        lines.push(row(&format!(
            "APPROVED {:>width$}",
            format!("${amount}"),
            width = WIDTH - 13
        )));
    }

    if let Some(cryptogram) = &view.cryptogram {
        lines.push(row(cryptogram));
    }

    if let Some(error) = &view.error_message {
        lines.push(row(&format!("! {error}")));
    }

    let action = if view.action_enabled {
        format!("[ {} ]", view.action_label)
    } else {
        format!("  {}  ", view.action_label)
    };
    lines.push(row(&format!("{action:^width$}", width = WIDTH - 4)));

    if debug {
        lines.push(border('├', '┤'));
        lines.push(row(&view.device_id));
        lines.push(row(&format!("Kernel: {}", view.kernel_version)));
    }

    lines.push(border('└', '┘'));
    lines.join("\n")
}

fn led(led: Led) -> &'static str {
    match led {
        Led::Blink => "(*)",
        Led::Green => "(G)",
        Led::Blue => "(B)",
        Led::Red => "(R)",
    }
}

fn border(left: char, right: char) -> String {
    format!("{left}{}{right}", "─".repeat(WIDTH - 2))
}

fn row(text: &str) -> String {
    let text: String = text.chars().take(WIDTH - 4).collect();
    format!("│ {text:<width$} │", width = WIDTH - 4)
}
