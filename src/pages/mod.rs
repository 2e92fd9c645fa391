use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Card, CardContent, CardDescription,
    CardHeader, CardTitle, Input, Label, Spinner,
};
use crate::components::{Composer, NoteCard, OcrPanel, StickyOverlay};
use crate::models::{Note, NoteView, SortKey};
use crate::notes::{displayed_notes, SearchSource};
use crate::state::{AppContext, NoticeKind, NotesController};
use crate::storage::{save_dark_mode, save_user_to_storage};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_navigate;

pub(crate) fn validate_login(email: &str, password: &str) -> Result<(), String> {
    if email.trim().is_empty() || password.is_empty() {
        return Err("Email and password are required".to_string());
    }
    Ok(())
}

pub(crate) fn validate_signup(email: &str, password: &str, confirm: &str) -> Result<(), String> {
    if email.trim().is_empty() || password.is_empty() {
        return Err("Email and password are required".to_string());
    }
    if password != confirm {
        return Err("Passwords do not match".to_string());
    }
    Ok(())
}

/// Grid identity of a card. Text edits keep the same card mounted; the card
/// reads its text from the store.
pub(crate) fn card_key(list: NoteView, note: &Note) -> (NoteView, String, Option<String>) {
    (list, note.id.clone(), note.color.clone())
}

#[component]
fn FormError(error: RwSignal<Option<String>>) -> impl IntoView {
    view! {
        <Show when=move || error.get().is_some() fallback=|| ().into_view()>
            <Alert class="border-destructive/30">
                <AlertDescription class="text-destructive text-xs">
                    {move || error.get().unwrap_or_default()}
                </AlertDescription>
            </Alert>
        </Show>
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();
    let navigate = StoredValue::new(use_navigate());

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let email_val = email.get();
        let password_val = password.get();
        if let Err(msg) = validate_login(&email_val, &password_val) {
            error.set(Some(msg));
            return;
        }
        let mut api_client = app_state.0.api_client.get_untracked();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client.login(email_val.trim(), &password_val).await {
                Ok(response) => {
                    api_client.set_token(response.token);
                    api_client.save_to_storage();
                    if let Some(user) = &response.user {
                        save_user_to_storage(user);
                    }
                    app_state.0.api_client.set(api_client);
                    app_state.0.current_user.set(response.user);
                    navigate.with_value(|nav| nav("/dashboard", Default::default()));
                }
                Err(e) => {
                    leptos::logging::warn!("Login failed: {e}");
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <a href="/" class="text-sm font-medium text-foreground">"Notify"</a>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">"Log in"</CardTitle>
                        <CardDescription class="text-xs">"Use your email and password to continue."</CardDescription>
                    </CardHeader>

                    <CardContent>
                        <form class="flex flex-col gap-3" on:submit=on_submit>
                            <div class="flex flex-col gap-1.5">
                                <Label html_for="email" class="text-xs">"Email"</Label>
                                <Input id="email" r#type="email" placeholder="you@example.com" bind_value=email class="h-8 text-sm" />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="password" class="text-xs">"Password"</Label>
                                <Input id="password" r#type="password" placeholder="••••••••" bind_value=password class="h-8 text-sm" />
                            </div>

                            <FormError error=error />

                            <Button class="w-full" size=ButtonSize::Sm attr:disabled=move || loading.get()>
                                <span class="inline-flex items-center gap-2">
                                    <Show when=move || loading.get() fallback=|| ().into_view()>
                                        <Spinner />
                                    </Show>
                                    {move || if loading.get() { "Signing in..." } else { "Continue" }}
                                </span>
                            </Button>

                            <div class="pt-1 text-xs text-muted-foreground">
                                "No account? "
                                <a class="text-primary underline underline-offset-4" href="/signup">"Sign up"</a>
                            </div>
                        </form>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

#[component]
pub fn SignupPage() -> impl IntoView {
    let username: RwSignal<String> = RwSignal::new(String::new());
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let confirm_password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();
    let navigate = StoredValue::new(use_navigate());

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let username_val = username.get();
        let email_val = email.get();
        let password_val = password.get();
        if let Err(msg) = validate_signup(&email_val, &password_val, &confirm_password.get()) {
            error.set(Some(msg));
            return;
        }
        let mut api_client = app_state.0.api_client.get_untracked();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client
                .signup(username_val.trim(), email_val.trim(), &password_val)
                .await
            {
                Ok(response) => {
                    api_client.set_token(response.token);
                    api_client.save_to_storage();
                    if let Some(user) = &response.user {
                        save_user_to_storage(user);
                    }
                    app_state.0.api_client.set(api_client);
                    app_state.0.current_user.set(response.user);
                    navigate.with_value(|nav| nav("/dashboard", Default::default()));
                }
                Err(e) => {
                    leptos::logging::warn!("Signup failed: {e}");
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <a href="/" class="text-sm font-medium text-foreground">"Notify"</a>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">"Create account"</CardTitle>
                        <CardDescription class="text-xs">"Your notes follow you on every device."</CardDescription>
                    </CardHeader>
                    <CardContent>
                        <form class="flex flex-col gap-3" on:submit=on_submit>
                            <div class="flex flex-col gap-1.5">
                                <Label html_for="username" class="text-xs">"Username"</Label>
                                <Input id="username" placeholder="yourname" bind_value=username class="h-8 text-sm" />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="email" class="text-xs">"Email"</Label>
                                <Input id="email" r#type="email" placeholder="you@example.com" bind_value=email class="h-8 text-sm" />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="password" class="text-xs">"Password"</Label>
                                <Input id="password" r#type="password" placeholder="••••••••" bind_value=password class="h-8 text-sm" />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="confirm_password" class="text-xs">"Confirm password"</Label>
                                <Input id="confirm_password" r#type="password" placeholder="••••••••" bind_value=confirm_password class="h-8 text-sm" />
                            </div>

                            <FormError error=error />

                            <Button class="w-full" size=ButtonSize::Sm attr:disabled=move || loading.get()>
                                <span class="inline-flex items-center gap-2">
                                    <Show when=move || loading.get() fallback=|| ().into_view()>
                                        <Spinner />
                                    </Show>
                                    {move || if loading.get() { "Creating..." } else { "Create account" }}
                                </span>
                            </Button>

                            <div class="pt-1 text-xs text-muted-foreground">
                                "Already have an account? "
                                <a class="text-primary underline underline-offset-4" href="/login">"Log in"</a>
                            </div>
                        </form>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

#[component]
fn Sidebar() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let view_sig = app_state.0.view;
    let dark = app_state.0.dark_mode;
    let navigate = StoredValue::new(use_navigate());

    let count = move |v: NoteView| app_state.0.store.with(|s| s.list(v).len());
    let nav_item = move |v: NoteView| {
        view! {
            <Button
                variant=ButtonVariant::Nav
                size=ButtonSize::Sm
                attr:aria-current=move || if view_sig.get() == v { Some("page") } else { None }
                on:click=move |_| view_sig.set(v)
            >
                <span class="flex-1 text-left">{v.to_string()}</span>
                <span class="text-xs text-muted-foreground">{move || count(v)}</span>
            </Button>
        }
    };

    let on_toggle_dark = move |_| {
        let next = !dark.get_untracked();
        dark.set(next);
        save_dark_mode(next);
    };

    let on_logout = move |_| {
        app_state.0.logout();
        navigate.with_value(|nav| nav("/login", Default::default()));
    };

    let user_name = move || {
        app_state
            .0
            .current_user
            .get()
            .and_then(|u| u.display_name())
            .unwrap_or_default()
    };

    view! {
        <aside class="flex w-52 shrink-0 flex-col gap-1 border-r bg-card px-3 py-4">
            <div class="mb-3 px-2">
                <div class="text-sm font-semibold">"Notify"</div>
                <div class="truncate text-xs text-muted-foreground">{user_name}</div>
            </div>
            {nav_item(NoteView::Notes)}
            {nav_item(NoteView::Archive)}
            {nav_item(NoteView::Trash)}
            <div class="mt-auto flex flex-col gap-1">
                <Button variant=ButtonVariant::Ghost size=ButtonSize::Sm on:click=on_toggle_dark>
                    {move || if dark.get() { "Light mode" } else { "Dark mode" }}
                </Button>
                <Button variant=ButtonVariant::Ghost size=ButtonSize::Sm on:click=on_logout>"Log out"</Button>
            </div>
        </aside>
    }
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let ctl = NotesController::new(app_state.0);
    let view_sig = app_state.0.view;
    let sort_key = app_state.0.sort_key;
    let query = app_state.0.search_query;

    spawn_local(ctl.load());

    let sidebar_open: RwSignal<bool> = RwSignal::new(true);

    let shown = Memo::new(move |_| {
        let v = view_sig.get();
        let q = query.get();
        let sort = sort_key.get();
        let notes = app_state.0.search.with(|res| {
            app_state
                .0
                .store
                .with(|s| displayed_notes(s, v, &q, res.as_ref(), sort))
        });
        notes.into_iter().map(|n| (v, n)).collect::<Vec<_>>()
    });

    let search_note = move || {
        app_state.0.search.with(|res| {
            let res = res.as_ref()?;
            match &res.source {
                SearchSource::LocalFallback { .. } => Some(format!(
                    "Server search unavailable, showing local matches for \"{}\"",
                    res.query
                )),
                _ => None,
            }
        })
    };

    view! {
        <div class=move || if app_state.0.dark_mode.get() { "dark" } else { "" }>
            <div class="flex min-h-screen bg-background text-foreground">
                <Show when=move || sidebar_open.get() fallback=|| ().into_view()>
                    <Sidebar />
                </Show>
                <main class="flex min-w-0 flex-1 flex-col gap-4 px-6 py-5">
                    <header class="flex items-center gap-2">
                        <Button
                            size=ButtonSize::Sm
                            variant=ButtonVariant::Ghost
                            on:click=move |_| sidebar_open.update(|o| *o = !*o)
                        >
                            {move || if sidebar_open.get() { "Hide menu" } else { "Menu" }}
                        </Button>
                        <Input
                            bind_value=query
                            placeholder="Search notes"
                            class="h-8 max-w-md text-sm"
                            on_input=Callback::new(move |q: String| ctl.on_query_input(q))
                        />
                        <Button
                            size=ButtonSize::Sm
                            variant=ButtonVariant::Outline
                            on:click=move |_| sort_key.update(|k| *k = k.toggled())
                        >
                            {move || match sort_key.get() {
                                SortKey::Date => "Sort: newest",
                                SortKey::Content => "Sort: A-Z",
                            }}
                        </Button>
                        <Show when=move || app_state.0.notes_loading.get() fallback=|| ().into_view()>
                            <Spinner />
                        </Show>
                    </header>

                    {move || app_state.0.notice.get().map(|n| {
                        let class = match n.kind {
                            NoticeKind::Error => "border-destructive/30 text-destructive",
                            NoticeKind::Info => "border-primary/30",
                        };
                        view! {
                            <Alert class=class>
                                <AlertDescription class="text-xs">{n.text}</AlertDescription>
                                <Button size=ButtonSize::Xs variant=ButtonVariant::Ghost on:click=move |_| app_state.0.clear_notice()>
                                    "Dismiss"
                                </Button>
                            </Alert>
                        }
                    })}

                    {move || search_note().map(|t| view! { <p class="text-xs text-muted-foreground">{t}</p> })}

                    <Show when=move || view_sig.get() == NoteView::Notes fallback=|| ().into_view()>
                        <div class="grid gap-4 lg:grid-cols-2">
                            <Composer />
                            <OcrPanel />
                        </div>
                    </Show>

                    <Show when=move || view_sig.get() == NoteView::Trash fallback=|| ().into_view()>
                        <div class="flex items-center justify-between text-xs text-muted-foreground">
                            <span>"Deleted notes are kept on this device only."</span>
                            <Button size=ButtonSize::Sm variant=ButtonVariant::Destructive on:click=move |_| ctl.empty_trash()>
                                "Empty trash"
                            </Button>
                        </div>
                    </Show>

                    <Show
                        when=move || !shown.with(|s| s.is_empty())
                        fallback=move || view! {
                            <div class="py-10 text-center text-sm text-muted-foreground">
                                {move || match view_sig.get() {
                                    NoteView::Notes => "No notes yet",
                                    NoteView::Archive => "Nothing archived",
                                    NoteView::Trash => "Trash is empty",
                                }}
                            </div>
                        }
                    >
                        <div class="grid grid-cols-1 gap-4 sm:grid-cols-2 xl:grid-cols-3">
                            <For
                                each=move || shown.get()
                                key=|(v, n)| card_key(*v, n)
                                children=|(v, n)| view! { <NoteCard note=n list=v /> }
                            />
                        </div>
                    </Show>
                </main>
            </div>
            <StickyOverlay />
        </div>
    }
}

/// Renders `children` for a signed-in user, the login form otherwise.
#[component]
pub fn RootAuthed(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let is_authenticated = move || app_state.0.api_client.get().is_authenticated();

    let children = StoredValue::new(children);

    view! {
        <Show when=is_authenticated fallback=move || view! { <LoginPage /> }>
            {move || children.with_value(|c| c())}
        </Show>
    }
}

#[component]
pub fn RootPage() -> impl IntoView {
    view! {
        <RootAuthed>
            <DashboardPage />
        </RootAuthed>
    }
}
