//! # Sketching session
//!
//! A session is the component's state: the selected files, one
//! [`FileStatus`] per filename, the sketch options and the component
//! config. Every operation is a synchronous handler; worker results arrive
//! later through [`Session::handle_message`]. Listeners are notified
//! explicitly after each state change.

use std::collections::BTreeMap;

use getset::{Getters, MutGetters};

use crate::config::ComponentConfig;
use crate::download::{build_archive, Download, ARCHIVE_MIME};
use crate::events::{Listener, Listeners, SessionEvent};
use crate::options::{FormInput, OptionKey, SketchOptions};
use crate::protocol::{SketchWorker, WorkerMessage, WorkerRequest};
use crate::selection::FileHandle;
use crate::status::FileStatus;
use crate::view::{FileRow, SessionView};
use crate::{Error, Result};

#[derive(Getters, MutGetters, Debug)]
pub struct Session<F, W> {
    #[getset(get = "pub")]
    config: ComponentConfig,

    #[getset(get = "pub", get_mut = "pub")]
    options: SketchOptions,

    #[getset(get = "pub")]
    selected: Vec<F>,

    #[getset(get = "pub")]
    statuses: BTreeMap<String, FileStatus>,

    #[getset(get = "pub")]
    worker: W,

    listeners: Listeners,
}

impl<F, W> Session<F, W>
where
    F: FileHandle,
    W: SketchWorker<F>,
{
    pub fn new(worker: W, config: ComponentConfig, options: SketchOptions) -> Session<F, W> {
        Session {
            config,
            options,
            selected: vec![],
            statuses: BTreeMap::new(),
            worker,
            listeners: Listeners::default(),
        }
    }

    pub fn subscribe<L>(&mut self, listener: L)
    where
        L: FnMut(&SessionEvent) + 'static,
    {
        self.listeners.push(Box::new(listener) as Listener);
    }

    fn notify(&mut self, event: SessionEvent) {
        self.listeners.emit(&event);
    }

    /// Replace the selection with the accepted subset of `files`.
    ///
    /// Nothing is sketched until [`Session::start_sketching`] is called.
    pub fn select_files<I>(&mut self, files: I)
    where
        I: IntoIterator<Item = F>,
    {
        self.selected = self.config.extensions.filter_files(files);
        log::debug!("{} files selected", self.selected.len());
        self.notify(SessionEvent::Changed);
    }

    /// Update one option from a form control. The form already shows the
    /// new value, so no change is broadcast.
    pub fn edit_option(&mut self, key: OptionKey, input: &FormInput) -> Result<()> {
        self.options.apply(key, input)
    }

    /// Like [`Session::edit_option`], with the field given by name.
    pub fn edit_option_by_name(&mut self, name: &str, input: &FormInput) -> Result<()> {
        let key: OptionKey = name.parse()?;
        self.edit_option(key, input)
    }

    /// Post every selected file and a snapshot of the options to the
    /// worker.
    pub fn start_sketching(&mut self) -> Result<()> {
        if self.selected.is_empty() {
            return Err(Error::NoFilesSelected);
        }

        if self.options.ksize == 0 || (self.options.num == 0 && self.options.scaled == 0) {
            log::warn!("sketching with unusual options: {:?}", self.options);
        }

        self.worker.post(WorkerRequest {
            files: &self.selected,
            options: self.options.clone(),
        })?;
        log::info!("requested sketches for {} files", self.selected.len());

        for file in &self.selected {
            self.statuses
                .entry(file.name().into_owned())
                .or_insert(FileStatus::Selected);
        }
        self.notify(SessionEvent::Changed);
        Ok(())
    }

    /// Forget files and results. In-flight worker jobs keep running.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.statuses.clear();
        self.notify(SessionEvent::Changed);
    }

    /// Apply a decoded worker event.
    pub fn handle_message(&mut self, msg: WorkerMessage) {
        match msg {
            WorkerMessage::Progress { filename, progress } => {
                self.update(&filename, |st| st.on_progress(progress));
                self.notify(SessionEvent::Changed);
            }
            WorkerMessage::Failed { filename, error } => {
                log::debug!("sketching {} failed: {}", filename, error);
                self.update(&filename, |st| st.on_error(error));
                self.notify(SessionEvent::Changed);
            }
            WorkerMessage::Generated {
                filename,
                signature,
            } => {
                self.update(&filename, |st| st.on_generated(signature.clone()));
                self.notify(SessionEvent::Load {
                    filename,
                    signature,
                });
                if self.all_completed() {
                    let signatures = self.signatures();
                    self.notify(SessionEvent::LoadEnd { signatures });
                }
                self.notify(SessionEvent::Changed);
            }
        }
    }

    /// Apply a raw worker message. Unrecognized messages are ignored.
    pub fn handle_json(&mut self, buf: &str) {
        if let Some(msg) = WorkerMessage::from_json(buf) {
            self.handle_message(msg);
        }
    }

    fn update<U>(&mut self, filename: &str, apply: U)
    where
        U: FnOnce(FileStatus) -> FileStatus,
    {
        let current = self
            .statuses
            .remove(filename)
            .unwrap_or(FileStatus::Selected);
        self.statuses.insert(filename.into(), apply(current));
    }

    pub fn status(&self, filename: &str) -> Option<&FileStatus> {
        self.statuses.get(filename)
    }

    pub fn progress(&self, filename: &str) -> Option<f64> {
        self.status(filename).map(FileStatus::progress)
    }

    pub fn signature(&self, filename: &str) -> Option<&str> {
        self.status(filename).and_then(FileStatus::signature)
    }

    pub fn error(&self, filename: &str) -> Option<&str> {
        self.status(filename).and_then(FileStatus::error)
    }

    /// Every computed signature, keyed by input filename.
    pub fn signatures(&self) -> BTreeMap<String, String> {
        self.completed()
            .map(|(name, sig)| (name.to_string(), sig.to_string()))
            .collect()
    }

    fn completed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.statuses
            .iter()
            .filter_map(|(name, st)| st.signature().map(|sig| (name.as_str(), sig)))
    }

    pub fn has_signatures(&self) -> bool {
        self.completed().next().is_some()
    }

    /// True when every tracked file has a signature.
    pub fn all_completed(&self) -> bool {
        self.statuses.values().all(|st| st.signature().is_some())
    }

    /// True when no requested file is still waiting on the worker.
    pub fn is_settled(&self) -> bool {
        self.statuses.values().all(FileStatus::is_terminal)
    }

    /// The signature of one file, ready to download as `<basename>.sig`.
    pub fn download_sketch(&self, filename: &str) -> Result<Download> {
        self.signature(filename)
            .map(|sig| Download::signature(filename, sig))
            .ok_or_else(|| Error::MissingSignature {
                filename: filename.into(),
            })
    }

    /// Every signature computed so far, bundled in one archive. Files
    /// without a signature are left out.
    pub fn download_all(&self) -> Result<Download> {
        let content = build_archive(self.completed())?;
        Ok(Download {
            filename: self.config.archive_name.clone(),
            mime: ARCHIVE_MIME,
            content,
        })
    }

    pub fn view(&self) -> SessionView {
        let rows = self
            .selected
            .iter()
            .map(|file| {
                let name = file.name().into_owned();
                let status = self.statuses.get(&name);
                let progress = status.map(FileStatus::progress).unwrap_or(0.0);
                FileRow {
                    glyph: status.and_then(FileStatus::glyph),
                    progress,
                    download_enabled: progress >= 100.0,
                    error: status.and_then(FileStatus::error).map(Into::into),
                    signature: if self.config.show_signatures {
                        status.and_then(FileStatus::signature).map(Into::into)
                    } else {
                        None
                    },
                    name,
                }
            })
            .collect();

        SessionView {
            options: self.options.clone(),
            accept: self.config.extensions.accept_attribute(),
            rows,
            show_download_all: self.has_signatures(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<(Vec<String>, SketchOptions)>>);

    impl SketchWorker<String> for Recorder {
        fn post(&self, request: WorkerRequest<'_, String>) -> Result<()> {
            self.0
                .borrow_mut()
                .push((request.files.to_vec(), request.options));
            Ok(())
        }
    }

    fn session() -> Session<String, Recorder> {
        Session::new(
            Recorder::default(),
            ComponentConfig::default(),
            SketchOptions::default(),
        )
    }

    #[test]
    fn start_posts_snapshot() {
        let mut s = session();
        s.select_files(vec!["a.fa".to_string(), "b.txt".to_string()]);
        s.edit_option(OptionKey::Ksize, &FormInput::Value("21".into()))
            .unwrap();
        s.start_sketching().unwrap();

        let posted = s.worker().0.borrow();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].0, vec!["a.fa".to_string()]);
        assert_eq!(posted[0].1.ksize, 21);
        assert_eq!(s.status("a.fa"), Some(&FileStatus::Selected));
    }

    #[test]
    fn unknown_option_name() {
        let mut s = session();
        assert!(s
            .edit_option_by_name("kmer", &FormInput::Value("1".into()))
            .is_err());
        s.edit_option_by_name("track_abundance", &FormInput::Checkbox(false))
            .unwrap();
        assert!(!s.options().track_abundance);
    }

    #[test]
    fn events_in_order() {
        let mut s = session();
        let seen = Rc::new(RefCell::new(vec![]));
        let sink = seen.clone();
        s.subscribe(move |ev| sink.borrow_mut().push(ev.clone()));

        s.handle_message(WorkerMessage::Progress {
            filename: "a.fa".into(),
            progress: 50.0,
        });
        s.handle_message(WorkerMessage::Progress {
            filename: "b.fa".into(),
            progress: 10.0,
        });
        s.handle_message(WorkerMessage::Generated {
            filename: "a.fa".into(),
            signature: "A".into(),
        });
        s.handle_message(WorkerMessage::Generated {
            filename: "b.fa".into(),
            signature: "B".into(),
        });

        let seen = seen.borrow();
        let lifecycle: Vec<_> = seen
            .iter()
            .filter(|ev| ev.dom_name().is_some())
            .collect();
        assert_eq!(lifecycle.len(), 3);
        assert_eq!(
            lifecycle[0],
            &SessionEvent::Load {
                filename: "a.fa".into(),
                signature: "A".into()
            }
        );
        match lifecycle[2] {
            SessionEvent::LoadEnd { signatures } => {
                assert_eq!(signatures.len(), 2);
                assert_eq!(signatures["b.fa"], "B");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn view_rows_follow_selection() {
        let mut s = session();
        s.select_files(vec!["a.fa".to_string(), "b.fq".to_string()]);
        s.handle_message(WorkerMessage::Generated {
            filename: "a.fa".into(),
            signature: "A".into(),
        });
        s.handle_message(WorkerMessage::Failed {
            filename: "b.fq".into(),
            error: "truncated".into(),
        });

        let view = s.view();
        assert!(view.show_download_all);
        assert_eq!(view.rows.len(), 2);
        assert!(view.rows[0].download_enabled);
        assert_eq!(view.rows[0].signature, None);
        assert!(!view.rows[1].download_enabled);
        assert_eq!(view.rows[1].error.as_deref(), Some("truncated"));
    }
}
