use is_terminal::IsTerminal;

/// Whether compiler messages may keep their color codes on stderr
pub fn keep_colors() -> bool {
    keep_colors_impl(|key| std::env::var(key).ok(), std::io::stderr().is_terminal())
}

fn keep_colors_impl(get_env: impl Fn(&str) -> Option<String>, is_tty: bool) -> bool {
    let term_is_dumb = get_env("TERM")
        .map(|term| term.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false);
    let no_color = get_env("NO_COLOR").is_some();

    is_tty && !term_is_dumb && !no_color
}
