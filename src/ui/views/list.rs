/// Render the `--list` overview: one indented entry per line under each
/// heading
pub fn render_list(sections: &[(&str, Vec<String>)]) -> String {
    let blocks: Vec<String> = sections
        .iter()
        .map(|(heading, entries)| {
            std::iter::once(format!("{}:", heading))
                .chain(entries.iter().map(|e| format!("  {}", e)))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect();
    format!("\n{}\n", blocks.join("\n\n"))
}
