//! Built-in debug viewer page.
//!
//! A dependency-free HTML page that subscribes to the state stream, shows
//! the live pose values, and forwards keyboard input back to the service.
//! The full 3D client lives under `/static`; this page exists so the
//! service is inspectable with nothing but a browser.

use axum::response::Html;

pub async fn index_page() -> Html<&'static str> {
    Html(PAGE)
}

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>foyer3d</title>
    <style>
        body { background: #181818; color: #ddd; font-family: monospace; margin: 2rem; }
        h1 { font-size: 1.1rem; }
        table { border-collapse: collapse; }
        td { padding: 0.15rem 0.8rem 0.15rem 0; }
        td:first-child { color: #888; }
        .hint { color: #666; margin-top: 1.5rem; font-size: 0.85rem; }
        #mouth-bar { display: inline-block; height: 0.6rem; background: #4ade80; vertical-align: middle; }
    </style>
</head>
<body>
    <h1>foyer3d &mdash; live avatar state</h1>
    <table>
        <tr><td>action</td><td id="action">-</td></tr>
        <tr><td>weights</td><td id="weights">-</td></tr>
        <tr><td>position</td><td id="position">-</td></tr>
        <tr><td>yaw</td><td id="yaw">-</td></tr>
        <tr><td>speed</td><td id="speed">-</td></tr>
        <tr><td>speaking</td><td id="speaking">-</td></tr>
        <tr><td>mouth</td><td><span id="mouth-bar" style="width:0"></span> <span id="mouth">0.00</span></td></tr>
        <tr><td>camera</td><td id="camera">-</td></tr>
    </table>
    <p class="hint">WASD to move, Shift to run, E toggles exploration.</p>

    <script>
        const fmt = (v) => Array.isArray(v)
            ? '[' + v.map(x => x.toFixed(2)).join(', ') + ']'
            : Number(v).toFixed(2);

        const source = new EventSource('/api/stream');
        source.addEventListener('state', (event) => {
            const s = JSON.parse(event.data);
            document.getElementById('action').textContent = s.action;
            document.getElementById('weights').textContent =
                s.weights.map(w => w.action + ':' + w.weight.toFixed(2)).join(' ');
            document.getElementById('position').textContent = fmt(s.position);
            document.getElementById('yaw').textContent = fmt(s.yaw);
            document.getElementById('speed').textContent = fmt(s.speed);
            document.getElementById('speaking').textContent = s.is_speaking;
            document.getElementById('mouth').textContent = fmt(s.mouth_open);
            document.getElementById('mouth-bar').style.width = (s.mouth_open * 120) + 'px';
            document.getElementById('camera').textContent =
                fmt(s.camera.position) + ' -> ' + fmt(s.camera.target);
        });
        source.onerror = () => setTimeout(() => window.location.reload(), 5000);

        const keys = { w: 'forward', s: 'backward', a: 'left', d: 'right' };
        let exploration = false;

        const send = (body) => fetch('/api/input', {
            method: 'POST',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify(body),
        });

        window.addEventListener('keydown', (e) => {
            if (e.repeat) return;
            const key = e.key.toLowerCase();
            if (keys[key]) send({ [keys[key]]: true });
            if (key === 'shift') send({ run: true });
            if (key === 'e') { exploration = !exploration; send({ exploration_enabled: exploration }); }
        });
        window.addEventListener('keyup', (e) => {
            const key = e.key.toLowerCase();
            if (keys[key]) send({ [keys[key]]: false });
            if (key === 'shift') send({ run: false });
        });
    </script>
</body>
</html>"#;
