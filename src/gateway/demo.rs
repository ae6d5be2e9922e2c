//! Sign-up demo page.
//!
//! A minimal form that loads the browser SDK, asks it for a client id on
//! submit and posts it as the hidden `castle_client_id` field.

use url::form_urlencoded::byte_serialize;

use crate::gateway::extract::CLIENT_ID_FIELD;

const SDK_URL: &str = "https://d2t77mnxyo7adj.cloudfront.net/v1/c.js";

/// Render the page for `app_id`, posting the form to `form_action`.
pub fn render_demo_page(app_id: &str, form_action: &str) -> String {
    let app_id: String = byte_serialize(app_id.as_bytes()).collect();
    let form_action = escape_attribute(form_action);

    format!(
        r#"<html>
<head>
  <link rel="icon" href="data:,">
  <script src="{SDK_URL}?{app_id}"></script>
  <script>
  window.onload = function() {{
    var form = document.getElementById('registration-form');
    form.addEventListener('submit', function(evt) {{
      evt.preventDefault();
      var input = document.createElement('input');
      input.setAttribute('type', 'hidden');
      input.setAttribute('name', '{CLIENT_ID_FIELD}');
      input.setAttribute('value', _castle('getClientId'));
      form.appendChild(input);
      form.submit();
    }});
  }}
  </script>
</head>
<body>
  <form action="{form_action}" method="POST" id="registration-form">
    <label for="username">username</label>
    <input type="text" name="username"><br><br>
    <input type="submit" value="submit">
  </form>
</body>
</html>
"#
    )
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
