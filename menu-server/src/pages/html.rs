//! HTML 片段工具: 转义、页面骨架

/// HTML 文本/属性转义
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; color: #1f2937; }
header { display: flex; justify-content: space-between; align-items: center; padding: 12px 16px; border-bottom: 1px solid #e5e7eb; }
nav.tabs { position: sticky; top: 0; background: #fff; display: flex; gap: 8px; padding: 8px 16px; border-bottom: 1px solid #e5e7eb; }
nav.tabs a { padding: 6px 12px; border-radius: 999px; text-decoration: none; color: inherit; }
nav.tabs a.active { background: #111827; color: #fff; }
main { padding: 16px; }
.menu-section { margin-bottom: 24px; }
.card { border: 1px solid #e5e7eb; border-radius: 8px; padding: 12px; margin-bottom: 8px; }
.card.soldout { opacity: .6; }
.badge { display: inline-block; font-size: 12px; padding: 2px 8px; border-radius: 999px; margin-right: 4px; }
.badge-primary { background: #111827; color: #fff; }
.badge-destructive { background: #dc2626; color: #fff; }
.badge-secondary { background: #f3f4f6; }
.badge-outline { border: 1px solid #d1d5db; }
.price { font-weight: 600; }
.notice { background: #ecfdf5; padding: 8px 16px; }
.status { padding: 24px 16px; color: #6b7280; }
.error { color: #dc2626; }
dialog, .dialog { display: block; border: 1px solid #d1d5db; border-radius: 8px; padding: 16px; margin: 16px; background: #fff; }
label { display: block; margin: 6px 0; }
"#;

/// 页面骨架; 订阅 `/api/events`，收到变更后刷新 (打开对话框时不刷新，避免丢失输入)
pub fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ko">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
{body}
<script>
(function () {{
  if (!window.EventSource) return;
  var source = new EventSource('/api/events');
  var reload = function () {{ if (!document.querySelector('.dialog')) location.reload(); }};
  source.addEventListener('data_changed', reload);
  source.addEventListener('auth_state_changed', reload);
}})();
</script>
</body>
</html>"#,
        title = escape(title),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<b class="x">Tom & 'Jerry'</b>"#),
            "&lt;b class=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape("김치찌개"), "김치찌개");
    }
}
