//! Bare-bones HTML pages. Every user-supplied string goes through [`escape`].

use std::fmt::Write;

use crate::auth::session::Flash;
use crate::users::User;

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

fn layout(title: &str, flashes: &[Flash], body: &str) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head><body>\n",
        escape(title)
    );
    html.push_str(
        "<nav><a href=\"/\">Home</a> <a href=\"/login\">Log in</a> \
         <a href=\"/register\">Register</a> <a href=\"/profile\">Profile</a> \
         <a href=\"/logout\">Log out</a></nav>\n",
    );
    for f in flashes {
        let _ = writeln!(
            html,
            "<p class=\"flash {}\">{}</p>",
            f.level.as_str(),
            escape(&f.message)
        );
    }
    html.push_str(body);
    html.push_str("\n</body></html>\n");
    html
}

pub fn index(username: Option<&str>, flashes: &[Flash]) -> String {
    let body = match username {
        Some(name) => format!("<h1>Hello, {}!</h1>", escape(name)),
        None => "<h1>Welcome</h1>\n<p>You are not logged in.</p>".to_string(),
    };
    layout("Home", flashes, &body)
}

pub fn login_form(flashes: &[Flash]) -> String {
    layout(
        "Log in",
        flashes,
        "<h1>Log in</h1>\n\
         <form method=\"post\" action=\"/login\">\n\
         <input name=\"username\" placeholder=\"Username\" required>\n\
         <input name=\"password\" type=\"password\" placeholder=\"Password\" required>\n\
         <button type=\"submit\">Log in</button>\n\
         </form>",
    )
}

pub fn register_form(flashes: &[Flash]) -> String {
    layout(
        "Register",
        flashes,
        "<h1>Register</h1>\n\
         <form method=\"post\" action=\"/register\">\n\
         <input name=\"username\" placeholder=\"Username\" required>\n\
         <input name=\"password\" type=\"password\" placeholder=\"Password\" required>\n\
         <input name=\"full_name\" placeholder=\"Full name\">\n\
         <input name=\"email\" type=\"email\" placeholder=\"Email\">\n\
         <button type=\"submit\">Register</button>\n\
         </form>",
    )
}

pub fn profile(user: &User, flashes: &[Flash]) -> String {
    let mut body = String::from("<h1>Profile</h1>\n<dl>\n");
    let rows = [
        ("ID", user.id.to_string()),
        ("Username", user.username.clone()),
        ("Full name", user.full_name.clone().unwrap_or_default()),
        ("Email", user.email.clone().unwrap_or_default()),
        ("Status", user.status.to_string()),
        ("Registered", user.created_at.date().to_string()),
    ];
    for (label, value) in rows {
        let _ = writeln!(body, "<dt>{label}</dt><dd>{}</dd>", escape(&value));
    }
    body.push_str("</dl>");
    layout("Profile", flashes, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::FlashLevel;
    use crate::users::UserStatus;
    use time::macros::datetime;

    #[test]
    fn escape_neutralises_markup() {
        assert_eq!(
            escape(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn flashes_are_rendered_with_level() {
        let flashes = [Flash {
            level: FlashLevel::Danger,
            message: "Invalid <b>".into(),
        }];
        let html = login_form(&flashes);
        assert!(html.contains("<p class=\"flash danger\">Invalid &lt;b&gt;</p>"));
    }

    #[test]
    fn index_shows_session_username() {
        assert!(index(Some("admin"), &[]).contains("Hello, admin!"));
        assert!(index(None, &[]).contains("not logged in"));
    }

    #[test]
    fn profile_lists_record_fields() {
        let user = User {
            id: 7,
            username: "ivan".into(),
            password: "hidden".into(),
            full_name: Some("Ivan Petrov".into()),
            email: None,
            status: UserStatus::Inactive,
            created_at: datetime!(2024-05-01 10:00 UTC),
        };
        let html = profile(&user, &[]);
        assert!(html.contains("<dd>Ivan Petrov</dd>"));
        assert!(html.contains("<dd>inactive</dd>"));
        assert!(html.contains("<dd>2024-05-01</dd>"));
        assert!(!html.contains("hidden"));
    }
}
