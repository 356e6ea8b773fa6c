//! Vim script snippets the host sends to the editor.

use serde_json::Value;
use walker_core::SurfaceId;
use walker_core::SurfaceRole;

const NOTIFY: &str = "walker#notify";
const AUGROUP: &str = "walker";

/// `text` as a Vim string literal. JSON string escapes are valid inside
/// Vim's double-quoted strings.
pub fn string_literal(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

/// Ex commands that open the scratch window for `role` and make it current.
pub fn open_surface(role: SurfaceRole, height: usize) -> Vec<String> {
    let name = role.name();
    let mut commands = vec![
        format!("silent botright {height}new"),
        "setlocal buftype=nofile bufhidden=wipe noswapfile nobuflisted".to_string(),
        "setlocal nowrap nonumber norelativenumber nospell winfixheight".to_string(),
        format!("silent! file {name}"),
        format!("setlocal filetype={name}"),
    ];
    // The selection stays visible while typing in the query window.
    if role == SurfaceRole::Results {
        commands.push("setlocal cursorline".to_string());
    }
    commands
}

fn notify(payload: &str) -> String {
    format!("call {NOTIFY}({payload})")
}

/// Buffer-local autocommands that ask for refreshes.
pub fn watch_surface(role: SurfaceRole, surface: SurfaceId) -> Vec<String> {
    let (events, force) = match role {
        SurfaceRole::Results => ("CursorHold,CursorHoldI", "v:true"),
        SurfaceRole::Query => ("TextChanged,TextChangedI,TextChangedP", "v:false"),
    };
    vec![
        format!("augroup {AUGROUP}"),
        format!("autocmd! * <buffer={surface}>"),
        format!(
            "autocmd {events} <buffer={surface}> {}",
            notify(&format!("{{'command': 'refresh', 'force': {force}}}"))
        ),
        "augroup END".to_string(),
    ]
}

/// Default buffer-local mappings for `role`.
pub fn key_bindings(role: SurfaceRole) -> Vec<String> {
    let accept = notify("{'command': 'accept'}");
    match role {
        SurfaceRole::Results => {
            let insert = notify("{'command': 'toggle-insert'}");
            vec![
                format!("nnoremap <buffer> <silent> <CR> :<C-u>{accept}<CR>"),
                format!("nnoremap <buffer> <silent> <Esc> :<C-u>{}<CR>", notify("{'command': 'cancel'}")),
                format!("nnoremap <buffer> <silent> i :<C-u>{insert}<CR>"),
                format!("nnoremap <buffer> <silent> a :<C-u>{insert}<CR>"),
            ]
        }
        SurfaceRole::Query => vec![
            format!("inoremap <buffer> <silent> <CR> <Esc>:<C-u>{accept}<CR>"),
            format!(
                "inoremap <buffer> <silent> <Esc> <Esc>:<C-u>{}<CR>",
                notify("{'command': 'toggle-normal'}")
            ),
            format!(
                "inoremap <buffer> <silent> <C-j> <C-o>:{}<CR>",
                notify("{'command': 'move-selection', 'down': v:true}")
            ),
            format!(
                "inoremap <buffer> <silent> <C-k> <C-o>:{}<CR>",
                notify("{'command': 'move-selection', 'down': v:false}")
            ),
            format!("nnoremap <buffer> <silent> <CR> :<C-u>{accept}<CR>"),
        ],
    }
}

pub fn edit_file(path: &str) -> String {
    format!("execute 'edit' fnameescape({})", string_literal(path))
}

pub fn echo(message: &str) -> String {
    format!("echo {}", string_literal(message))
}

pub fn echo_error(message: &str) -> String {
    format!(
        "echohl ErrorMsg | echomsg {} | echohl None",
        string_literal(message)
    )
}

pub fn wipe(surface: SurfaceId) -> String {
    format!("silent! bwipeout! {surface}")
}
