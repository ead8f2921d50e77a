// NetworkSummary — architecture and parameter counts at a glance

use std::fmt;

/// One row of a [`NetworkSummary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSummary {
    pub activation: &'static str,
    pub params: usize,
    pub input_width: usize,
    pub output_width: usize,
}

/// Summary of a network's configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSummary {
    pub optimizer: String,
    pub loss: &'static str,
    pub accuracy: &'static str,
    pub input_width: usize,
    pub output_width: usize,
    pub layers: Vec<LayerSummary>,
    /// Sum of `params` over all layers.
    pub total_params: usize,
}

const WIDTH: usize = 60;

impl fmt::Display for NetworkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "─".repeat(WIDTH);
        writeln!(f, "┌{}┐", rule)?;
        writeln!(f, "│{:^w$}│", "Network Summary", w = WIDTH)?;
        writeln!(f, "├{}┤", rule)?;
        let header = format!("{} / {} / {}", self.optimizer, self.loss, self.accuracy);
        writeln!(f, "│ {:<w$} │", header, w = WIDTH - 2)?;
        writeln!(f, "│ {:<w$} │", format!("Input width: {}", self.input_width), w = WIDTH - 2)?;
        writeln!(f, "├{}┤", rule)?;
        for layer in &self.layers {
            let row = format!(
                "Dense-{:<10} params {:>6}   [{:>4} -> {:>4}]",
                layer.activation, layer.params, layer.input_width, layer.output_width
            );
            writeln!(f, "│ {:<w$} │", row, w = WIDTH - 2)?;
        }
        writeln!(f, "├{}┤", rule)?;
        writeln!(f, "│ {:<w$} │", format!("Output width: {}", self.output_width), w = WIDTH - 2)?;
        writeln!(f, "│ {:<w$} │", format!("Total params: {}", self.total_params), w = WIDTH - 2)?;
        write!(f, "└{}┘", rule)
    }
}
