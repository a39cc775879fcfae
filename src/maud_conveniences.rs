use maud::{Markup, Render, html};

pub fn render_nav() -> Markup {
    html! {
        nav class="w-full bg-gray-800 shadow-md mb-8" {
            div class="max-w-6xl mx-auto px-4 py-3 flex flex-row items-center space-x-4" {
                a href="/" class="font-bold text-lg mr-4" {"Rollcall"}
                a href="/students" class="bg-slate-600 hover:bg-slate-800 font-bold py-2 px-4 rounded" {"Students"}
                a href="/students/scan" class="bg-slate-600 hover:bg-slate-800 font-bold py-2 px-4 rounded" {"Scan QR"}
            }
        }
    }
}

pub fn title(s: impl Render) -> Markup {
    html! {
        h1 class="text-2xl font-semibold mb-4" {(s)}
    }
}

pub fn subtitle(s: impl Render) -> Markup {
    html! {
        h2 class="text-xl font-semibold mb-2" {(s)}
    }
}

pub fn form_element(id: &'static str, label: &'static str, input: Markup) -> Markup {
    html! {
        div class="mb-4" {
            label for=(id) class="block text-sm font-bold mb-2 text-gray-300" {(label)}
            (input)
        }
    }
}

pub fn simple_form_element(
    id: &'static str,
    label: &'static str,
    required: bool,
    ty: Option<&'static str>,
    value: Option<&str>,
) -> Markup {
    form_element(
        id,
        label,
        html! {
            input type=(ty.unwrap_or("text")) id=(id) name=(id) required[required] value=[value] class="shadow appearance-none border rounded w-full py-2 px-3 leading-tight focus:outline-none focus:shadow-outline bg-gray-700 border-gray-600" {}
        },
    )
}

pub fn form_submit_button(text: Option<&str>) -> Markup {
    html! {
        div class="flex items-center justify-between" {
            button type="submit" class="bg-blue-500 hover:bg-blue-700 font-bold py-2 px-4 rounded focus:outline-none focus:shadow-outline" {
                (text.unwrap_or("Submit"))
            }
        }
    }
}

pub fn errors_list(title: Option<&str>, errors: impl Iterator<Item = impl Render>) -> Markup {
    html! {
        div class="bg-red-100 border border-red-400 text-red-700 px-4 py-3 rounded relative mb-4" role="alert" {
            @if let Some(title) = title {
                strong class="font-bold" {(title)}
            }
            ul class="list-disc list-inside" {
                @for error in errors {
                    li {(error)}
                }
            }
        }
    }
}

pub fn success_banner(message: impl Render) -> Markup {
    html! {
        div class="bg-green-100 border border-green-400 text-green-700 px-4 py-3 rounded relative mb-4" role="status" {
            (message)
        }
    }
}

///a label over a value, for read-only detail pages
pub fn detail_field(label: &'static str, value: impl Render) -> Markup {
    html! {
        div {
            p class="text-gray-300 text-sm" {(label)}
            p class="text-gray-100 text-lg font-semibold" {(value)}
        }
    }
}
